use std::collections::BTreeMap;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::access::{Credential, CredentialRepository, NewCredential, RosterEntry};
use crate::domain::errors::{StorageError, UniqueKey};
use crate::domain::guest::{Guest, GuestChanges, GuestRepository, NewGuest};

// ============================================================================
// In-Memory Store
// ============================================================================
//
// Process-local implementation of both storage ports. Enforces the same
// unique constraints and delete semantics as the Postgres schema so the
// domain sees identical behaviour. Each call holds the lock for its whole
// check-and-write, which gives the per-row atomicity the services rely on.
//
// ============================================================================

#[derive(Default)]
struct State {
    guests: BTreeMap<i64, Guest>,
    credentials: BTreeMap<i64, Credential>,
    next_guest_id: i64,
    next_credential_id: i64,
}

impl State {
    fn check_guest_constraints(&self, candidate: &Guest) -> Result<(), StorageError> {
        for other in self.guests.values().filter(|g| g.id != candidate.id) {
            if other.first_name == candidate.first_name && other.last_name == candidate.last_name {
                return Err(StorageError::UniqueViolation(UniqueKey::GuestName));
            }
            if candidate.phone.is_some() && other.phone == candidate.phone {
                return Err(StorageError::UniqueViolation(UniqueKey::GuestPhone));
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GuestRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Guest>, StorageError> {
        let state = self.state.read().await;
        let mut guests: Vec<Guest> = state.guests.values().cloned().collect();
        guests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(guests)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Guest>, StorageError> {
        Ok(self.state.read().await.guests.get(&id).cloned())
    }

    async fn get_by_phone(&self, phone: &str) -> Result<Option<Guest>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .guests
            .values()
            .find(|g| g.phone.as_deref() == Some(phone))
            .cloned())
    }

    async fn get_by_name(&self, first_name: &str, last_name: &str) -> Result<Option<Guest>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .guests
            .values()
            .find(|g| g.first_name == first_name && g.last_name == last_name)
            .cloned())
    }

    async fn family_group_exists(&self, family_group: i64) -> Result<bool, StorageError> {
        let state = self.state.read().await;
        Ok(state.guests.values().any(|g| g.family_group == family_group))
    }

    async fn next_family_group(&self) -> Result<i64, StorageError> {
        let state = self.state.read().await;
        let max = state.guests.values().map(|g| g.family_group).max().unwrap_or(0);
        Ok(max + 1)
    }

    async fn create(&self, guest: &NewGuest, creator: &str) -> Result<Guest, StorageError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut record = Guest {
            id: 0,
            first_name: guest.first_name.clone(),
            last_name: guest.last_name.clone(),
            phone: guest.phone.clone(),
            relationship: guest.relationship,
            confirmed: false,
            family_group: guest.family_group,
            created_by: creator.to_string(),
            updated_by: creator.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.check_guest_constraints(&record)?;

        state.next_guest_id += 1;
        record.id = state.next_guest_id;
        state.guests.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: i64, changes: &GuestChanges, modifier: &str) -> Result<Option<Guest>, StorageError> {
        let mut state = self.state.write().await;
        let Some(current) = state.guests.get(&id) else {
            return Ok(None);
        };

        let mut updated = current.clone();
        changes.apply_to(&mut updated);
        updated.updated_by = modifier.to_string();
        updated.updated_at = Utc::now();
        state.check_guest_constraints(&updated)?;

        state.guests.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        let mut state = self.state.write().await;
        if state.guests.remove(&id).is_none() {
            return Ok(false);
        }
        // ON DELETE SET NULL
        for credential in state.credentials.values_mut() {
            if credential.guest_id == Some(id) {
                credential.guest_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl CredentialRepository for MemoryStore {
    async fn get_by_code(&self, code: &str) -> Result<Option<Credential>, StorageError> {
        let state = self.state.read().await;
        Ok(state.credentials.values().find(|c| c.code == code).cloned())
    }

    async fn get_by_guest_id(&self, guest_id: i64) -> Result<Option<Credential>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .credentials
            .values()
            .find(|c| c.guest_id == Some(guest_id))
            .cloned())
    }

    async fn create(&self, credential: &NewCredential) -> Result<Credential, StorageError> {
        let mut state = self.state.write().await;
        for other in state.credentials.values() {
            if other.code == credential.code {
                return Err(StorageError::UniqueViolation(UniqueKey::CredentialCode));
            }
            if credential.guest_id.is_some() && other.guest_id == credential.guest_id {
                return Err(StorageError::UniqueViolation(UniqueKey::CredentialGuest));
            }
        }

        state.next_credential_id += 1;
        let now = Utc::now();
        let record = Credential {
            id: state.next_credential_id,
            guest_id: credential.guest_id,
            role: credential.role,
            code: credential.code.clone(),
            created_at: now,
            updated_at: now,
        };
        state.credentials.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_with_guest_names(&self) -> Result<Vec<RosterEntry>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .credentials
            .values()
            .map(|c| {
                let guest = c.guest_id.and_then(|id| state.guests.get(&id));
                RosterEntry {
                    code: c.code.clone(),
                    role: c.role,
                    first_name: guest.map(|g| g.first_name.clone()).unwrap_or_default(),
                    last_name: guest.map(|g| g.last_name.clone()).unwrap_or_default(),
                }
            })
            .collect())
    }
}
