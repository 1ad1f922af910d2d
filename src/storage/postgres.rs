use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::domain::access::{Credential, CredentialRepository, NewCredential, Role, RosterEntry};
use crate::domain::errors::{StorageError, UniqueKey};
use crate::domain::guest::{Guest, GuestChanges, GuestRepository, NewGuest, Relationship};
use crate::utils::{retry_on_transient, RetryConfig};

// ============================================================================
// PostgreSQL Store
// ============================================================================
//
// Tables `guests` and `users` (see migrations/). Unique constraint hits are
// reported by name so the domain can translate them; every other failure is
// passed through as `StorageError::Database`.
//
// ============================================================================

const GUEST_COLUMNS: &str = "id, first_name, last_name, phone, relationship, confirmed, \
     family_group, created_by, updated_by, created_at, updated_at";

const CREDENTIAL_COLUMNS: &str = "id, guest_id, role, uracf, created_at, updated_at";

#[derive(Debug, FromRow)]
struct GuestRow {
    id: i64,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    relationship: String,
    confirmed: bool,
    family_group: i64,
    created_by: String,
    updated_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<GuestRow> for Guest {
    type Error = StorageError;

    fn try_from(row: GuestRow) -> Result<Self, Self::Error> {
        let relationship = Relationship::parse(row.relationship.trim()).map_err(|_| {
            StorageError::CorruptRow(format!(
                "guest {} has relationship '{}'",
                row.id, row.relationship
            ))
        })?;

        Ok(Guest {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            relationship,
            confirmed: row.confirmed,
            family_group: row.family_group,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct CredentialRow {
    id: i64,
    guest_id: Option<i64>,
    role: String,
    uracf: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_role(id: i64, raw: &str) -> Result<Role, StorageError> {
    Role::parse(raw.trim())
        .ok_or_else(|| StorageError::CorruptRow(format!("user {} has role '{}'", id, raw)))
}

impl TryFrom<CredentialRow> for Credential {
    type Error = StorageError;

    fn try_from(row: CredentialRow) -> Result<Self, Self::Error> {
        Ok(Credential {
            id: row.id,
            guest_id: row.guest_id,
            role: parse_role(row.id, &row.role)?,
            code: row.uracf.trim().to_string(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RosterRow {
    id: i64,
    uracf: String,
    role: String,
    first_name: String,
    last_name: String,
}

/// Name the violated unique constraint when there is one we know about.
fn map_db_error(e: sqlx::Error) -> StorageError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            if let Some(key) = db.constraint().and_then(UniqueKey::from_constraint) {
                return StorageError::UniqueViolation(key);
            }
        }
    }
    StorageError::Database(e)
}

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open the pool, retrying while the database is unreachable.
    pub async fn connect(config: &DatabaseConfig, url: &str) -> Result<Self, sqlx::Error> {
        let pool = retry_on_transient(RetryConfig::startup(), |attempt| {
            tracing::info!(attempt = attempt, "Connecting to PostgreSQL...");
            PgPoolOptions::new()
                .min_connections(config.min_connections)
                .max_connections(config.max_connections)
                .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
                .connect(url)
        })
        .await
        .into_result()?;

        tracing::info!(
            max_connections = config.max_connections,
            "✅ Connected to PostgreSQL"
        );
        Ok(Self::new(pool))
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("📦 Database migrations applied");
        Ok(())
    }
}

fn into_guest(row: Option<GuestRow>) -> Result<Option<Guest>, StorageError> {
    row.map(Guest::try_from).transpose()
}

#[async_trait]
impl GuestRepository for PostgresStore {
    async fn list(&self) -> Result<Vec<Guest>, StorageError> {
        let sql = format!(
            "SELECT {} FROM guests ORDER BY created_at DESC, id DESC",
            GUEST_COLUMNS
        );
        sqlx::query_as::<_, GuestRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Database)?
            .into_iter()
            .map(Guest::try_from)
            .collect()
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Guest>, StorageError> {
        let sql = format!("SELECT {} FROM guests WHERE id = $1", GUEST_COLUMNS);
        let row = sqlx::query_as::<_, GuestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Database)?;
        into_guest(row)
    }

    async fn get_by_phone(&self, phone: &str) -> Result<Option<Guest>, StorageError> {
        let sql = format!("SELECT {} FROM guests WHERE phone = $1", GUEST_COLUMNS);
        let row = sqlx::query_as::<_, GuestRow>(&sql)
            .bind(phone)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Database)?;
        into_guest(row)
    }

    async fn get_by_name(&self, first_name: &str, last_name: &str) -> Result<Option<Guest>, StorageError> {
        let sql = format!(
            "SELECT {} FROM guests WHERE first_name = $1 AND last_name = $2",
            GUEST_COLUMNS
        );
        let row = sqlx::query_as::<_, GuestRow>(&sql)
            .bind(first_name)
            .bind(last_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Database)?;
        into_guest(row)
    }

    async fn family_group_exists(&self, family_group: i64) -> Result<bool, StorageError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM guests WHERE family_group = $1)")
            .bind(family_group)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Database)
    }

    async fn next_family_group(&self) -> Result<i64, StorageError> {
        sqlx::query_scalar::<_, i64>("SELECT COALESCE(MAX(family_group), 0) + 1 FROM guests")
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Database)
    }

    async fn create(&self, guest: &NewGuest, creator: &str) -> Result<Guest, StorageError> {
        let sql = format!(
            r#"
            INSERT INTO guests (first_name, last_name, phone, relationship, family_group, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {}
            "#,
            GUEST_COLUMNS
        );
        let row = sqlx::query_as::<_, GuestRow>(&sql)
            .bind(&guest.first_name)
            .bind(&guest.last_name)
            .bind(&guest.phone)
            .bind(guest.relationship.code())
            .bind(guest.family_group)
            .bind(creator)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Guest::try_from(row)
    }

    async fn update(&self, id: i64, changes: &GuestChanges, modifier: &str) -> Result<Option<Guest>, StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Database)?;

        let select = format!("SELECT {} FROM guests WHERE id = $1 FOR UPDATE", GUEST_COLUMNS);
        let current = sqlx::query_as::<_, GuestRow>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StorageError::Database)?;

        let Some(current) = current else {
            return Ok(None);
        };

        let mut guest = Guest::try_from(current)?;
        changes.apply_to(&mut guest);

        let update = format!(
            r#"
            UPDATE guests
            SET first_name = $2, last_name = $3, phone = $4, relationship = $5,
                confirmed = $6, family_group = $7, updated_by = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            GUEST_COLUMNS
        );
        let row = sqlx::query_as::<_, GuestRow>(&update)
            .bind(id)
            .bind(&guest.first_name)
            .bind(&guest.last_name)
            .bind(&guest.phone)
            .bind(guest.relationship.code())
            .bind(guest.confirmed)
            .bind(guest.family_group)
            .bind(modifier)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(StorageError::Database)?;

        Guest::try_from(row).map(Some)
    }

    async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM guests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Database)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CredentialRepository for PostgresStore {
    async fn get_by_code(&self, code: &str) -> Result<Option<Credential>, StorageError> {
        let sql = format!("SELECT {} FROM users WHERE uracf = $1", CREDENTIAL_COLUMNS);
        sqlx::query_as::<_, CredentialRow>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Database)?
            .map(Credential::try_from)
            .transpose()
    }

    async fn get_by_guest_id(&self, guest_id: i64) -> Result<Option<Credential>, StorageError> {
        let sql = format!("SELECT {} FROM users WHERE guest_id = $1", CREDENTIAL_COLUMNS);
        sqlx::query_as::<_, CredentialRow>(&sql)
            .bind(guest_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Database)?
            .map(Credential::try_from)
            .transpose()
    }

    async fn create(&self, credential: &NewCredential) -> Result<Credential, StorageError> {
        let sql = format!(
            "INSERT INTO users (guest_id, role, uracf) VALUES ($1, $2, $3) RETURNING {}",
            CREDENTIAL_COLUMNS
        );
        let row = sqlx::query_as::<_, CredentialRow>(&sql)
            .bind(credential.guest_id)
            .bind(credential.role.as_str())
            .bind(&credential.code)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Credential::try_from(row)
    }

    async fn list_with_guest_names(&self) -> Result<Vec<RosterEntry>, StorageError> {
        let rows = sqlx::query_as::<_, RosterRow>(
            r#"
            SELECT u.id, u.uracf, u.role,
                   COALESCE(g.first_name, '') AS first_name,
                   COALESCE(g.last_name, '') AS last_name
            FROM users u
            LEFT JOIN guests g ON g.id = u.guest_id
            ORDER BY u.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        rows.into_iter()
            .map(|row| {
                Ok(RosterEntry {
                    role: parse_role(row.id, &row.role)?,
                    code: row.uracf.trim().to_string(),
                    first_name: row.first_name,
                    last_name: row.last_name,
                })
            })
            .collect()
    }
}
