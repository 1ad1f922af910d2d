use serde::Deserialize;

use crate::domain::validation::{is_valid_phone, require_positive_family_group, ValidationError};
use super::value_objects::{Guest, Relationship};

// ============================================================================
// Guest Inputs
// ============================================================================
//
// Raw inputs arrive exactly as decoded at the boundary. `validate` turns them
// into typed drafts/changes that the directory and storage work with.
//
// ============================================================================

/// Request to add a guest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateGuest {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub relationship: String,
    pub family_group: Option<i64>,
}

/// Partial update: `None` leaves the field untouched.
///
/// For `phone`, `Some("")` is an explicit request to clear it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateGuest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub relationship: Option<String>,
    pub confirmed: Option<bool>,
    pub family_group: Option<i64>,
}

/// Validated create input, family group still unresolved
#[derive(Debug, Clone, PartialEq)]
pub struct GuestDraft {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub relationship: Relationship,
    pub family_group: Option<i64>,
}

/// Fully resolved guest ready for storage
#[derive(Debug, Clone, PartialEq)]
pub struct NewGuest {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub relationship: Relationship,
    pub family_group: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PhoneChange {
    Set(String),
    Clear,
}

/// Validated partial update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuestChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<PhoneChange>,
    pub relationship: Option<Relationship>,
    pub confirmed: Option<bool>,
    pub family_group: Option<i64>,
}

fn required_name(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(trimmed.to_string())
}

fn optional_phone(value: &str) -> Result<Option<String>, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if !is_valid_phone(trimmed) {
        return Err(ValidationError::InvalidPhone(trimmed.to_string()));
    }
    Ok(Some(trimmed.to_string()))
}

impl CreateGuest {
    pub fn validate(&self) -> Result<GuestDraft, ValidationError> {
        let first_name = required_name(&self.first_name, "first_name")?;
        let last_name = required_name(&self.last_name, "last_name")?;
        let phone = match &self.phone {
            Some(raw) => optional_phone(raw)?,
            None => None,
        };
        let relationship = Relationship::parse(&self.relationship)?;
        let family_group = self
            .family_group
            .map(require_positive_family_group)
            .transpose()?;

        Ok(GuestDraft {
            first_name,
            last_name,
            phone,
            relationship,
            family_group,
        })
    }
}

impl GuestDraft {
    pub fn into_new(self, family_group: i64) -> NewGuest {
        NewGuest {
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            relationship: self.relationship,
            family_group,
        }
    }
}

impl UpdateGuest {
    pub fn validate(&self) -> Result<GuestChanges, ValidationError> {
        let first_name = self
            .first_name
            .as_deref()
            .map(|v| required_name(v, "first_name"))
            .transpose()?;
        let last_name = self
            .last_name
            .as_deref()
            .map(|v| required_name(v, "last_name"))
            .transpose()?;
        let phone = match self.phone.as_deref() {
            None => None,
            Some(raw) => Some(match optional_phone(raw)? {
                Some(phone) => PhoneChange::Set(phone),
                None => PhoneChange::Clear,
            }),
        };
        let relationship = self
            .relationship
            .as_deref()
            .map(Relationship::parse)
            .transpose()?;
        let family_group = self
            .family_group
            .map(require_positive_family_group)
            .transpose()?;

        Ok(GuestChanges {
            first_name,
            last_name,
            phone,
            relationship,
            confirmed: self.confirmed,
            family_group,
        })
    }
}

impl GuestChanges {
    pub fn touches_name(&self) -> bool {
        self.first_name.is_some() || self.last_name.is_some()
    }

    /// Phone the update will store, if it sets one
    pub fn new_phone(&self) -> Option<&str> {
        match &self.phone {
            Some(PhoneChange::Set(phone)) => Some(phone),
            _ => None,
        }
    }

    /// Apply the changes onto a record (audit fields are left to the caller).
    pub fn apply_to(&self, guest: &mut Guest) {
        if let Some(ref first_name) = self.first_name {
            guest.first_name = first_name.clone();
        }
        if let Some(ref last_name) = self.last_name {
            guest.last_name = last_name.clone();
        }
        match &self.phone {
            Some(PhoneChange::Set(phone)) => guest.phone = Some(phone.clone()),
            Some(PhoneChange::Clear) => guest.phone = None,
            None => {}
        }
        if let Some(relationship) = self.relationship {
            guest.relationship = relationship;
        }
        if let Some(confirmed) = self.confirmed {
            guest.confirmed = confirmed;
        }
        if let Some(family_group) = self.family_group {
            guest.family_group = family_group;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_input() -> CreateGuest {
        CreateGuest {
            first_name: "Maria".to_string(),
            last_name: "Santos".to_string(),
            phone: Some("11988888888".to_string()),
            relationship: "R".to_string(),
            family_group: Some(1),
        }
    }

    fn stored_guest() -> Guest {
        let now = Utc::now();
        Guest {
            id: 7,
            first_name: "Maria".to_string(),
            last_name: "Santos".to_string(),
            phone: Some("11988888888".to_string()),
            relationship: Relationship::Responsible,
            confirmed: false,
            family_group: 1,
            created_by: "USR01".to_string(),
            updated_by: "USR01".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_create_validation_success() {
        let draft = create_input().validate().unwrap();
        assert_eq!(draft.first_name, "Maria");
        assert_eq!(draft.phone.as_deref(), Some("11988888888"));
        assert_eq!(draft.relationship, Relationship::Responsible);
        assert_eq!(draft.family_group, Some(1));
    }

    #[test]
    fn test_create_requires_names() {
        let mut input = create_input();
        input.first_name = "  ".to_string();
        assert_eq!(input.validate().unwrap_err(), ValidationError::Required("first_name"));

        let mut input = create_input();
        input.last_name = String::new();
        assert_eq!(input.validate().unwrap_err().field(), "last_name");
    }

    #[test]
    fn test_create_empty_phone_is_absent() {
        let mut input = create_input();
        input.phone = Some(String::new());
        assert_eq!(input.validate().unwrap().phone, None);
    }

    #[test]
    fn test_create_rejects_bad_phone_relationship_and_group() {
        let mut input = create_input();
        input.phone = Some("11812345678".to_string());
        assert_eq!(input.validate().unwrap_err().field(), "phone");

        let mut input = create_input();
        input.relationship = "X".to_string();
        assert_eq!(input.validate().unwrap_err().field(), "relationship");

        let mut input = create_input();
        input.family_group = Some(0);
        assert_eq!(input.validate().unwrap_err().field(), "family_group");
    }

    #[test]
    fn test_update_distinguishes_absent_and_empty_phone() {
        let absent = UpdateGuest::default().validate().unwrap();
        assert_eq!(absent.phone, None);

        let cleared = UpdateGuest {
            phone: Some(String::new()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(cleared.phone, Some(PhoneChange::Clear));
        assert_eq!(cleared.new_phone(), None);
    }

    #[test]
    fn test_update_rejects_empty_name() {
        let err = UpdateGuest {
            last_name: Some(" ".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, ValidationError::Required("last_name"));
    }

    #[test]
    fn test_changes_apply_only_supplied_fields() {
        let mut guest = stored_guest();
        let changes = UpdateGuest {
            first_name: Some("Mariana".to_string()),
            phone: Some(String::new()),
            confirmed: Some(true),
            ..Default::default()
        }
        .validate()
        .unwrap();

        changes.apply_to(&mut guest);

        assert_eq!(guest.first_name, "Mariana");
        assert_eq!(guest.last_name, "Santos"); // unchanged
        assert_eq!(guest.phone, None);
        assert!(guest.confirmed);
        assert_eq!(guest.family_group, 1);
    }

    #[test]
    fn test_update_decodes_missing_fields_as_absent() {
        let input: UpdateGuest = serde_json::from_str(r#"{"confirmed": true}"#).unwrap();
        assert_eq!(input.confirmed, Some(true));
        assert!(input.phone.is_none());
        assert!(!input.validate().unwrap().touches_name());
    }
}
