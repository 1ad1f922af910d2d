use crate::domain::errors::{ErrorKind, StorageError};
use crate::domain::validation::ValidationError;

// ============================================================================
// Guest Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GuestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("access code '{0}' is not authorized to perform this operation")]
    Forbidden(String),

    #[error("a guest named '{first_name} {last_name}' already exists")]
    DuplicateName { first_name: String, last_name: String },

    #[error("phone '{0}' is already registered to another guest")]
    DuplicatePhone(String),

    #[error("guest {0} not found")]
    NotFound(i64),

    #[error("family group {0} not found")]
    FamilyGroupNotFound(i64),

    #[error("internal server error")]
    Internal(#[source] StorageError),
}

impl GuestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GuestError::Validation(_) => ErrorKind::Validation,
            GuestError::Forbidden(_) => ErrorKind::Forbidden,
            GuestError::DuplicateName { .. } | GuestError::DuplicatePhone(_) => ErrorKind::Conflict,
            GuestError::NotFound(_) | GuestError::FamilyGroupNotFound(_) => ErrorKind::NotFound,
            GuestError::Internal(_) => ErrorKind::Internal,
        }
    }
}
