use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Access Credential Value Objects
// ============================================================================

/// Credential role. The two owners are the couple; every linked credential is `Guest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Groom,
    Bride,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Groom => "groom",
            Role::Bride => "bride",
            Role::Guest => "guest",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "groom" => Some(Role::Groom),
            "bride" => Some(Role::Bride),
            "guest" => Some(Role::Guest),
            _ => None,
        }
    }
}

/// A stored access credential ("user")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_id: Option<i64>,
    pub role: Role,
    #[serde(rename = "uracf")]
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCredential {
    pub guest_id: Option<i64>,
    pub role: Role,
    pub code: String,
}

/// Result of the unauthenticated phone probe.
///
/// Deliberately identical for "no guest" and "guest without credential".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl CheckResult {
    pub fn absent() -> Self {
        Self { exists: false, role: None }
    }
}

/// Administrative roster row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    #[serde(rename = "uracf")]
    pub code: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
}
