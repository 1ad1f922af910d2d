use lazy_static::lazy_static;
use regex::Regex;

// ============================================================================
// Shared Validation Predicates
// ============================================================================
//
// Pure format checks used by both the guest directory and the access
// registry. Nothing here touches storage.
//
// ============================================================================

lazy_static! {
    /// Area code (2 digits) + mobile prefix 9 + 8 digits
    static ref PHONE_RE: Regex = Regex::new(r"^\d{2}9\d{8}$").expect("phone pattern compiles");
    static ref CREDENTIAL_CODE_RE: Regex =
        Regex::new(r"^[A-Z0-9]{5}$").expect("credential pattern compiles");
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Expects an already upper-cased code.
pub fn is_valid_credential_code(code: &str) -> bool {
    CREDENTIAL_CODE_RE.is_match(code)
}

/// Trim and upper-case a raw credential code.
pub fn normalize_credential_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Input shape failures. Never logged as errors; the caller fixes and resubmits.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("invalid phone '{0}': expected area code + 9 + 8 digits (e.g. 11912345678)")]
    InvalidPhone(String),

    #[error("invalid access code '{0}': expected 5 letters or digits")]
    InvalidCredentialCode(String),

    #[error("invalid relationship '{0}': expected P or R")]
    InvalidRelationship(String),

    #[error("family group must be greater than zero, got {0}")]
    NonPositiveFamilyGroup(i64),
}

impl ValidationError {
    /// Name of the offending input field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Required(field) => field,
            ValidationError::InvalidPhone(_) => "phone",
            ValidationError::InvalidCredentialCode(_) => "code",
            ValidationError::InvalidRelationship(_) => "relationship",
            ValidationError::NonPositiveFamilyGroup(_) => "family_group",
        }
    }
}

/// Require a present, well-formed phone.
pub fn require_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.is_empty() {
        return Err(ValidationError::Required("phone"));
    }
    if !is_valid_phone(phone) {
        return Err(ValidationError::InvalidPhone(phone.to_string()));
    }
    Ok(())
}

/// Normalize and check a credential code, returning the canonical form.
pub fn require_credential_code(raw: &str) -> Result<String, ValidationError> {
    let code = normalize_credential_code(raw);
    if code.is_empty() {
        return Err(ValidationError::Required("code"));
    }
    if !is_valid_credential_code(&code) {
        return Err(ValidationError::InvalidCredentialCode(raw.to_string()));
    }
    Ok(code)
}

pub fn require_positive_family_group(group: i64) -> Result<i64, ValidationError> {
    if group <= 0 {
        return Err(ValidationError::NonPositiveFamilyGroup(group));
    }
    Ok(group)
}
