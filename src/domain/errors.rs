// ============================================================================
// Failure Taxonomy shared by all domain services
// ============================================================================

/// Coarse failure class every domain error maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Forbidden,
    Conflict,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Unique constraints enforced at the storage boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    GuestName,
    GuestPhone,
    CredentialCode,
    CredentialGuest,
}

impl UniqueKey {
    /// Postgres constraint name backing this key
    pub fn constraint_name(&self) -> &'static str {
        match self {
            UniqueKey::GuestName => "guests_name_key",
            UniqueKey::GuestPhone => "guests_phone_key",
            UniqueKey::CredentialCode => "users_uracf_key",
            UniqueKey::CredentialGuest => "users_guest_id_key",
        }
    }

    pub fn from_constraint(name: &str) -> Option<Self> {
        [
            UniqueKey::GuestName,
            UniqueKey::GuestPhone,
            UniqueKey::CredentialCode,
            UniqueKey::CredentialGuest,
        ]
        .into_iter()
        .find(|key| key.constraint_name() == name)
    }
}

/// Errors surfaced by storage adapters.
///
/// Absent rows are not errors: lookups return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unique constraint violated: {}", .0.constraint_name())]
    UniqueViolation(UniqueKey),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_key_constraint_round_trip() {
        for key in [
            UniqueKey::GuestName,
            UniqueKey::GuestPhone,
            UniqueKey::CredentialCode,
            UniqueKey::CredentialGuest,
        ] {
            assert_eq!(UniqueKey::from_constraint(key.constraint_name()), Some(key));
        }
        assert_eq!(UniqueKey::from_constraint("guests_pkey"), None);
    }

    #[test]
    fn test_error_kind_labels() {
        assert_eq!(ErrorKind::NotFound.as_str(), "not_found");
        assert_eq!(ErrorKind::Conflict.as_str(), "conflict");
    }
}
