use async_trait::async_trait;

use crate::domain::errors::StorageError;
use super::commands::{GuestChanges, NewGuest};
use super::value_objects::Guest;

// ============================================================================
// Guest Storage Port
// ============================================================================
//
// Lookups return `Ok(None)` for absent rows so callers can tell "missing"
// apart from a failing backend. Implementations must enforce the name and
// phone unique constraints and report hits as `StorageError::UniqueViolation`.
//
// ============================================================================

#[async_trait]
pub trait GuestRepository: Send + Sync {
    /// All guests, most recently created first
    async fn list(&self) -> Result<Vec<Guest>, StorageError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Guest>, StorageError>;

    async fn get_by_phone(&self, phone: &str) -> Result<Option<Guest>, StorageError>;

    async fn get_by_name(&self, first_name: &str, last_name: &str) -> Result<Option<Guest>, StorageError>;

    async fn family_group_exists(&self, family_group: i64) -> Result<bool, StorageError>;

    /// `max(family_group) + 1`, or 1 for an empty table
    async fn next_family_group(&self) -> Result<i64, StorageError>;

    async fn create(&self, guest: &NewGuest, creator: &str) -> Result<Guest, StorageError>;

    /// `Ok(None)` when the id does not exist
    async fn update(
        &self,
        id: i64,
        changes: &GuestChanges,
        modifier: &str,
    ) -> Result<Option<Guest>, StorageError>;

    /// `Ok(false)` when the id does not exist
    async fn delete(&self, id: i64) -> Result<bool, StorageError>;
}

/// Authorization probe the directory runs before any mutation
#[async_trait]
pub trait CredentialChecker: Send + Sync {
    async fn credential_exists(&self, code: &str) -> Result<bool, StorageError>;
}
