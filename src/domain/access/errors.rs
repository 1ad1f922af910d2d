use crate::domain::errors::{ErrorKind, StorageError};
use crate::domain::validation::ValidationError;

// ============================================================================
// Access Registry Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no guest found with phone '{0}'")]
    GuestNotFound(String),

    #[error("this guest is already registered")]
    AlreadyRegistered(i64),

    #[error("access code '{0}' is already in use")]
    CredentialTaken(String),

    #[error("access code not found")]
    NotFound,

    #[error("internal server error")]
    Internal(#[source] StorageError),
}

impl AccessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccessError::Validation(_) => ErrorKind::Validation,
            AccessError::GuestNotFound(_) | AccessError::NotFound => ErrorKind::NotFound,
            AccessError::AlreadyRegistered(_) | AccessError::CredentialTaken(_) => ErrorKind::Conflict,
            AccessError::Internal(_) => ErrorKind::Internal,
        }
    }
}
