//! Postgres-backed client directory.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | DirectoryError |
//! |------------|----------------------|----------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / network / other | N/A | `Backend` |
//!
//! Updates and deletes that touch no row map to `NotFound`.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use mqgate_auth::{ApiKey, ClientDirectory, ClientRecord, DirectoryError};
use mqgate_core::ClientId;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS clients (
    id      UUID PRIMARY KEY,
    name    TEXT NOT NULL UNIQUE,
    api_key TEXT NOT NULL UNIQUE
)
"#;

/// Client records in a `clients` table.
///
/// Uniqueness of `name` and `api_key` is enforced by the table constraints.
#[derive(Debug, Clone)]
pub struct PostgresClientDirectory {
    pool: Arc<PgPool>,
}

impl PostgresClientDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Connect a pool and make sure the table exists.
    pub async fn connect(database_url: &str) -> Result<Self, DirectoryError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let directory = Self::new(pool);
        directory.ensure_schema().await?;
        Ok(directory)
    }

    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), DirectoryError> {
        sqlx::query(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

fn record_from_row(row: &PgRow) -> Result<ClientRecord, DirectoryError> {
    let id: Uuid = row
        .try_get("id")
        .map_err(|e| map_sqlx_error("decode id", e))?;
    let name: String = row
        .try_get("name")
        .map_err(|e| map_sqlx_error("decode name", e))?;
    let api_key: String = row
        .try_get("api_key")
        .map_err(|e| map_sqlx_error("decode api_key", e))?;

    Ok(ClientRecord {
        id: ClientId::from_uuid(id),
        name,
        api_key: ApiKey::from_string(api_key),
    })
}

#[async_trait]
impl ClientDirectory for PostgresClientDirectory {
    #[instrument(skip(self, api_key), err)]
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<ClientRecord>, DirectoryError> {
        let row = sqlx::query("SELECT id, name, api_key FROM clients WHERE api_key = $1")
            .bind(api_key)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_api_key", e))?;
        row.as_ref().map(record_from_row).transpose()
    }

    #[instrument(skip(self), fields(client_id = %id), err)]
    async fn find_by_id(&self, id: ClientId) -> Result<Option<ClientRecord>, DirectoryError> {
        let row = sqlx::query("SELECT id, name, api_key FROM clients WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_id", e))?;
        row.as_ref().map(record_from_row).transpose()
    }

    #[instrument(skip(self, record), fields(client_id = %record.id), err)]
    async fn create(&self, record: ClientRecord) -> Result<ClientRecord, DirectoryError> {
        sqlx::query("INSERT INTO clients (id, name, api_key) VALUES ($1, $2, $3)")
            .bind(record.id.as_uuid())
            .bind(&record.name)
            .bind(record.api_key.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create", e))?;
        Ok(record)
    }

    #[instrument(skip(self, record), fields(client_id = %record.id), err)]
    async fn update(&self, record: ClientRecord) -> Result<ClientRecord, DirectoryError> {
        let result = sqlx::query("UPDATE clients SET name = $2, api_key = $3 WHERE id = $1")
            .bind(record.id.as_uuid())
            .bind(&record.name)
            .bind(record.api_key.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update", e))?;
        if result.rows_affected() == 0 {
            return Err(DirectoryError::NotFound);
        }
        Ok(record)
    }

    #[instrument(skip(self), fields(client_id = %id), err)]
    async fn delete(&self, id: ClientId) -> Result<(), DirectoryError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;
        if result.rows_affected() == 0 {
            return Err(DirectoryError::NotFound);
        }
        Ok(())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> DirectoryError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => DirectoryError::Conflict(
            format!("unique constraint violated in {operation}: {}", db_err.message()),
        ),
        sqlx::Error::Database(db_err) => {
            DirectoryError::Backend(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            DirectoryError::Backend(format!("connection pool closed in {operation}"))
        }
        other => DirectoryError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}
