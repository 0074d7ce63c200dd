//! Client directory abstraction (storage-agnostic).
//!
//! The directory is the only path to client records. Implementations enforce
//! uniqueness of both `name` and `api_key`.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use mqgate_core::ClientId;

use crate::client::ClientRecord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("client not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("directory backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ClientDirectory: Send + Sync {
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<ClientRecord>, DirectoryError>;

    async fn find_by_id(&self, id: ClientId) -> Result<Option<ClientRecord>, DirectoryError>;

    async fn create(&self, record: ClientRecord) -> Result<ClientRecord, DirectoryError>;

    /// Replace an existing record (matched by id).
    async fn update(&self, record: ClientRecord) -> Result<ClientRecord, DirectoryError>;

    async fn delete(&self, id: ClientId) -> Result<(), DirectoryError>;
}

/// In-memory client directory.
///
/// Intended for tests/dev. Records are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryClientDirectory {
    records: RwLock<HashMap<ClientId, ClientRecord>>,
}

impl InMemoryClientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unique(
        records: &HashMap<ClientId, ClientRecord>,
        candidate: &ClientRecord,
    ) -> Result<(), DirectoryError> {
        for existing in records.values().filter(|r| r.id != candidate.id) {
            if existing.name == candidate.name {
                return Err(DirectoryError::Conflict(format!(
                    "client name '{}' already taken",
                    candidate.name
                )));
            }
            if existing.api_key == candidate.api_key {
                return Err(DirectoryError::Conflict("api key already in use".to_string()));
            }
        }
        Ok(())
    }
}

fn poisoned() -> DirectoryError {
    DirectoryError::Backend("lock poisoned".to_string())
}

#[async_trait]
impl ClientDirectory for InMemoryClientDirectory {
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<ClientRecord>, DirectoryError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records
            .values()
            .find(|r| r.api_key.as_str() == api_key)
            .cloned())
    }

    async fn find_by_id(&self, id: ClientId) -> Result<Option<ClientRecord>, DirectoryError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(&id).cloned())
    }

    async fn create(&self, record: ClientRecord) -> Result<ClientRecord, DirectoryError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        if records.contains_key(&record.id) {
            return Err(DirectoryError::Conflict(format!("client {} already exists", record.id)));
        }
        Self::check_unique(&records, &record)?;
        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, record: ClientRecord) -> Result<ClientRecord, DirectoryError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        if !records.contains_key(&record.id) {
            return Err(DirectoryError::NotFound);
        }
        Self::check_unique(&records, &record)?;
        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: ClientId) -> Result<(), DirectoryError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.remove(&id).map(|_| ()).ok_or(DirectoryError::NotFound)
    }
}
