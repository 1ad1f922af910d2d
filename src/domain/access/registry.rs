use std::sync::Arc;
use async_trait::async_trait;

use crate::domain::errors::{StorageError, UniqueKey};
use crate::domain::guest::{CredentialChecker, GuestRepository};
use crate::domain::validation::{normalize_credential_code, require_credential_code, require_phone};
use super::commands::RegisterCredential;
use super::errors::AccessError;
use super::repository::CredentialRepository;
use super::value_objects::{CheckResult, Credential, NewCredential, Role, RosterEntry};

// ============================================================================
// Access Registry
// ============================================================================
//
// Owns the credential-to-guest linkage. Reads guests through the guest
// storage port but never writes them.
//
// ============================================================================

pub struct AccessRegistry {
    repo: Arc<dyn CredentialRepository>,
    guests: Arc<dyn GuestRepository>,
}

impl AccessRegistry {
    pub fn new(repo: Arc<dyn CredentialRepository>, guests: Arc<dyn GuestRepository>) -> Self {
        Self { repo, guests }
    }

    /// Fast authorization probe
    pub async fn exists_by_credential(&self, code: &str) -> Result<bool, AccessError> {
        self.credential_exists(code).await.map_err(|e| {
            tracing::error!(error = %e, "Access code lookup failed");
            AccessError::Internal(e)
        })
    }

    pub async fn register(&self, input: RegisterCredential) -> Result<Credential, AccessError> {
        require_phone(&input.phone).map_err(|e| {
            tracing::warn!(field = e.field(), error = %e, "Register rejected: invalid phone");
            AccessError::from(e)
        })?;
        let code = require_credential_code(&input.code).map_err(|e| {
            tracing::warn!(field = e.field(), error = %e, "Register rejected: invalid access code");
            AccessError::from(e)
        })?;

        let guest = self
            .guests
            .get_by_phone(&input.phone)
            .await
            .map_err(|e| {
                tracing::error!(phone = %input.phone, error = %e, "Guest lookup failed");
                AccessError::Internal(e)
            })?
            .ok_or_else(|| {
                tracing::warn!(phone = %input.phone, "Register: no guest with this phone");
                AccessError::GuestNotFound(input.phone.clone())
            })?;

        let linked = self.repo.get_by_guest_id(guest.id).await.map_err(|e| {
            tracing::error!(guest_id = guest.id, error = %e, "Linked credential lookup failed");
            AccessError::Internal(e)
        })?;
        if linked.is_some() {
            tracing::warn!(guest_id = guest.id, "Register: guest already has an access code");
            return Err(AccessError::AlreadyRegistered(guest.id));
        }

        let taken = self.repo.get_by_code(&code).await.map_err(|e| {
            tracing::error!(error = %e, "Access code lookup failed");
            AccessError::Internal(e)
        })?;
        if taken.is_some() {
            tracing::warn!(code = %code, "Register: access code already in use");
            return Err(AccessError::CredentialTaken(code));
        }

        let new_credential = NewCredential {
            guest_id: Some(guest.id),
            role: Role::Guest,
            code,
        };

        match self.repo.create(&new_credential).await {
            Ok(created) => {
                tracing::info!(credential_id = created.id, guest_id = guest.id, "✅ Access code registered");
                Ok(created)
            }
            Err(StorageError::UniqueViolation(UniqueKey::CredentialGuest)) => {
                tracing::warn!(guest_id = guest.id, "Register: guest linked concurrently");
                Err(AccessError::AlreadyRegistered(guest.id))
            }
            Err(StorageError::UniqueViolation(UniqueKey::CredentialCode)) => {
                tracing::warn!(code = %new_credential.code, "Register: access code taken concurrently");
                Err(AccessError::CredentialTaken(new_credential.code))
            }
            Err(e) => {
                tracing::error!(guest_id = guest.id, error = %e, "Failed to create access code");
                Err(AccessError::Internal(e))
            }
        }
    }

    /// Unauthenticated probe: never reveals whether the guest or the credential was missing.
    pub async fn check_by_phone(&self, phone: &str) -> Result<CheckResult, AccessError> {
        require_phone(phone).map_err(|e| {
            tracing::warn!(error = %e, "Phone check rejected: invalid phone");
            AccessError::from(e)
        })?;

        let guest = match self.guests.get_by_phone(phone).await {
            Ok(Some(guest)) => guest,
            Ok(None) => {
                tracing::debug!(phone = %phone, "Phone check: no guest");
                return Ok(CheckResult::absent());
            }
            Err(e) => {
                tracing::error!(phone = %phone, error = %e, "Guest lookup failed");
                return Err(AccessError::Internal(e));
            }
        };

        match self.repo.get_by_guest_id(guest.id).await {
            Ok(Some(credential)) => Ok(CheckResult {
                exists: true,
                role: Some(credential.role),
            }),
            Ok(None) => {
                tracing::debug!(guest_id = guest.id, "Phone check: guest has no access code");
                Ok(CheckResult::absent())
            }
            Err(e) => {
                tracing::error!(guest_id = guest.id, error = %e, "Linked credential lookup failed");
                Err(AccessError::Internal(e))
            }
        }
    }

    pub async fn get_by_credential(&self, code: &str) -> Result<Credential, AccessError> {
        let code = normalize_credential_code(code);
        match self.repo.get_by_code(&code).await {
            Ok(Some(credential)) => Ok(credential),
            Ok(None) => Err(AccessError::NotFound),
            Err(e) => {
                tracing::error!(error = %e, "Access code lookup failed");
                Err(AccessError::Internal(e))
            }
        }
    }

    /// "Who am I" lookup
    pub async fn get_role_for_credential(&self, code: &str) -> Result<Role, AccessError> {
        Ok(self.get_by_credential(code).await?.role)
    }

    pub async fn roster(&self) -> Result<Vec<RosterEntry>, AccessError> {
        self.repo.list_with_guest_names().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to list access codes");
            AccessError::Internal(e)
        })
    }

    /// Create the owner credentials if absent. Never fails the caller.
    pub async fn seed_bootstrap(&self, groom_code: &str, bride_code: &str) {
        self.seed_owner(groom_code, Role::Groom).await;
        self.seed_owner(bride_code, Role::Bride).await;
    }

    async fn seed_owner(&self, raw_code: &str, role: Role) {
        let code = normalize_credential_code(raw_code);
        if code.is_empty() {
            tracing::info!(role = role.as_str(), "Seed skipped: no access code configured");
            return;
        }
        let code = match require_credential_code(&code) {
            Ok(code) => code,
            Err(e) => {
                tracing::warn!(role = role.as_str(), error = %e, "Seed skipped: malformed access code");
                return;
            }
        };

        match self.repo.get_by_code(&code).await {
            Ok(Some(_)) => {
                tracing::debug!(role = role.as_str(), "Seed skipped: access code already present");
                return;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(role = role.as_str(), error = %e, "Seed lookup failed");
                return;
            }
        }

        let owner = NewCredential {
            guest_id: None,
            role,
            code,
        };
        match self.repo.create(&owner).await {
            Ok(created) => tracing::info!(role = role.as_str(), credential_id = created.id, "🌱 Owner access code seeded"),
            Err(e) => tracing::error!(role = role.as_str(), error = %e, "Failed to seed owner access code"),
        }
    }
}

#[async_trait]
impl CredentialChecker for AccessRegistry {
    async fn credential_exists(&self, code: &str) -> Result<bool, StorageError> {
        let code = normalize_credential_code(code);
        Ok(self.repo.get_by_code(&code).await?.is_some())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
