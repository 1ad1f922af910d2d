use std::sync::Arc;

use crate::domain::errors::{StorageError, UniqueKey};
use super::commands::{CreateGuest, GuestDraft, NewGuest, UpdateGuest};
use super::errors::GuestError;
use super::repository::{CredentialChecker, GuestRepository};
use super::value_objects::Guest;

// ============================================================================
// Guest Directory
// ============================================================================
//
// Orchestrates: Input → Validation → Authorization → Uniqueness → Storage
//
// Uniqueness is checked twice: a lookup up front for a precise message, and
// the storage unique constraints as the authoritative backstop. A constraint
// hit is translated into the same Conflict the lookup would have produced.
//
// ============================================================================

pub struct GuestDirectory {
    repo: Arc<dyn GuestRepository>,
    credentials: Arc<dyn CredentialChecker>,
}

impl GuestDirectory {
    pub fn new(repo: Arc<dyn GuestRepository>, credentials: Arc<dyn CredentialChecker>) -> Self {
        Self { repo, credentials }
    }

    pub async fn list(&self) -> Result<Vec<Guest>, GuestError> {
        self.repo.list().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to list guests");
            GuestError::Internal(e)
        })
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Guest, GuestError> {
        match self.repo.get_by_id(id).await {
            Ok(Some(guest)) => Ok(guest),
            Ok(None) => {
                tracing::debug!(guest_id = id, "Guest not found");
                Err(GuestError::NotFound(id))
            }
            Err(e) => {
                tracing::error!(guest_id = id, error = %e, "Failed to load guest");
                Err(GuestError::Internal(e))
            }
        }
    }

    pub async fn create(&self, input: CreateGuest, caller: &str) -> Result<Guest, GuestError> {
        let draft = input.validate().map_err(|e| {
            tracing::warn!(field = e.field(), error = %e, "Guest create rejected: invalid input");
            GuestError::from(e)
        })?;

        self.authorize(caller).await?;

        self.ensure_name_free(&draft.first_name, &draft.last_name, None).await?;
        if let Some(ref phone) = draft.phone {
            self.ensure_phone_free(phone, None).await?;
        }

        let new_guest = self.resolve_family_group(draft).await?;

        match self.repo.create(&new_guest, caller).await {
            Ok(guest) => {
                tracing::info!(
                    guest_id = guest.id,
                    name = %guest.full_name(),
                    family_group = guest.family_group,
                    caller = %caller,
                    "✅ Guest created"
                );
                Ok(guest)
            }
            Err(e) => Err(self.storage_failure(e, &new_guest.first_name, &new_guest.last_name, new_guest.phone.as_deref())),
        }
    }

    pub async fn update(&self, id: i64, input: UpdateGuest, caller: &str) -> Result<Guest, GuestError> {
        let changes = input.validate().map_err(|e| {
            tracing::warn!(guest_id = id, field = e.field(), error = %e, "Guest update rejected: invalid input");
            GuestError::from(e)
        })?;

        self.authorize(caller).await?;

        let current = self.get_by_id(id).await?;

        if let Some(phone) = changes.new_phone() {
            self.ensure_phone_free(phone, Some(id)).await?;
        }

        let first_name = changes.first_name.clone().unwrap_or_else(|| current.first_name.clone());
        let last_name = changes.last_name.clone().unwrap_or_else(|| current.last_name.clone());
        if changes.touches_name() {
            self.ensure_name_free(&first_name, &last_name, Some(id)).await?;
        }

        if let Some(family_group) = changes.family_group {
            if family_group != current.family_group {
                self.ensure_family_group_exists(family_group).await?;
            }
        }

        match self.repo.update(id, &changes, caller).await {
            Ok(Some(guest)) => {
                tracing::info!(guest_id = guest.id, caller = %caller, "✅ Guest updated");
                Ok(guest)
            }
            Ok(None) => {
                tracing::warn!(guest_id = id, "Guest vanished before update");
                Err(GuestError::NotFound(id))
            }
            Err(e) => Err(self.storage_failure(e, &first_name, &last_name, changes.new_phone())),
        }
    }

    pub async fn delete(&self, id: i64) -> Result<(), GuestError> {
        match self.repo.delete(id).await {
            Ok(true) => {
                tracing::info!(guest_id = id, "Guest deleted");
                Ok(())
            }
            Ok(false) => {
                tracing::warn!(guest_id = id, "Guest delete: not found");
                Err(GuestError::NotFound(id))
            }
            Err(e) => {
                tracing::error!(guest_id = id, error = %e, "Failed to delete guest");
                Err(GuestError::Internal(e))
            }
        }
    }

    async fn authorize(&self, caller: &str) -> Result<(), GuestError> {
        match self.credentials.credential_exists(caller).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::warn!(caller = %caller, "Unknown access code attempted a guest mutation");
                Err(GuestError::Forbidden(caller.to_string()))
            }
            Err(e) => {
                tracing::error!(caller = %caller, error = %e, "Access code check failed");
                Err(GuestError::Internal(e))
            }
        }
    }

    /// `exclude` is the guest being updated, which may keep its own name.
    async fn ensure_name_free(&self, first_name: &str, last_name: &str, exclude: Option<i64>) -> Result<(), GuestError> {
        let existing = self.repo.get_by_name(first_name, last_name).await.map_err(|e| {
            tracing::error!(first_name = %first_name, last_name = %last_name, error = %e, "Name lookup failed");
            GuestError::Internal(e)
        })?;

        match existing {
            Some(other) if Some(other.id) != exclude => {
                tracing::warn!(first_name = %first_name, last_name = %last_name, "Duplicate guest name");
                Err(GuestError::DuplicateName {
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    async fn ensure_phone_free(&self, phone: &str, exclude: Option<i64>) -> Result<(), GuestError> {
        let existing = self.repo.get_by_phone(phone).await.map_err(|e| {
            tracing::error!(phone = %phone, error = %e, "Phone lookup failed");
            GuestError::Internal(e)
        })?;

        match existing {
            Some(other) if Some(other.id) != exclude => {
                tracing::warn!(phone = %phone, "Duplicate guest phone");
                Err(GuestError::DuplicatePhone(phone.to_string()))
            }
            _ => Ok(()),
        }
    }

    async fn ensure_family_group_exists(&self, family_group: i64) -> Result<(), GuestError> {
        match self.repo.family_group_exists(family_group).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::warn!(family_group = family_group, "Family group not found");
                Err(GuestError::FamilyGroupNotFound(family_group))
            }
            Err(e) => {
                tracing::error!(family_group = family_group, error = %e, "Family group lookup failed");
                Err(GuestError::Internal(e))
            }
        }
    }

    async fn resolve_family_group(&self, draft: GuestDraft) -> Result<NewGuest, GuestError> {
        let family_group = match draft.family_group {
            Some(family_group) => {
                self.ensure_family_group_exists(family_group).await?;
                family_group
            }
            None => self.repo.next_family_group().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to compute next family group");
                GuestError::Internal(e)
            })?,
        };
        Ok(draft.into_new(family_group))
    }

    fn storage_failure(&self, e: StorageError, first_name: &str, last_name: &str, phone: Option<&str>) -> GuestError {
        match e {
            StorageError::UniqueViolation(UniqueKey::GuestName) => {
                tracing::warn!(first_name = %first_name, last_name = %last_name, "Duplicate guest name caught by storage constraint");
                GuestError::DuplicateName {
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                }
            }
            StorageError::UniqueViolation(UniqueKey::GuestPhone) => {
                tracing::warn!(phone = ?phone, "Duplicate guest phone caught by storage constraint");
                GuestError::DuplicatePhone(phone.unwrap_or_default().to_string())
            }
            other => {
                tracing::error!(error = %other, "Guest write failed");
                GuestError::Internal(other)
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
