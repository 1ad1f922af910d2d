use async_trait::async_trait;

use crate::domain::errors::StorageError;
use super::value_objects::{Credential, NewCredential, RosterEntry};

/// Credential storage port. Code and guest link are both unique.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn get_by_code(&self, code: &str) -> Result<Option<Credential>, StorageError>;

    async fn get_by_guest_id(&self, guest_id: i64) -> Result<Option<Credential>, StorageError>;

    async fn create(&self, credential: &NewCredential) -> Result<Credential, StorageError>;

    async fn list_with_guest_names(&self) -> Result<Vec<RosterEntry>, StorageError>;
}
