use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::validation::ValidationError;

// ============================================================================
// Guest Value Objects
// ============================================================================

/// How a guest relates to the couple. Wire values are the single-letter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relationship {
    #[serde(rename = "P")]
    Principal,
    #[serde(rename = "R")]
    Responsible,
}

impl Relationship {
    pub fn code(&self) -> &'static str {
        match self {
            Relationship::Principal => "P",
            Relationship::Responsible => "R",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw {
            "P" => Ok(Relationship::Principal),
            "R" => Ok(Relationship::Responsible),
            other => Err(ValidationError::InvalidRelationship(other.to_string())),
        }
    }
}

/// A stored guest record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub relationship: Relationship,
    pub confirmed: bool,
    pub family_group: i64,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guest {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_parse() {
        assert_eq!(Relationship::parse("P").unwrap(), Relationship::Principal);
        assert_eq!(Relationship::parse("R").unwrap(), Relationship::Responsible);
        assert!(matches!(
            Relationship::parse("p"),
            Err(ValidationError::InvalidRelationship(_))
        ));
        assert!(Relationship::parse("").is_err());
    }

    #[test]
    fn test_relationship_wire_format() {
        let json = serde_json::to_string(&Relationship::Responsible).unwrap();
        assert_eq!(json, "\"R\"");
        let parsed: Relationship = serde_json::from_str("\"P\"").unwrap();
        assert_eq!(parsed, Relationship::Principal);
    }
}
