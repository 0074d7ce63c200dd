//! Client use cases: token issuance and client management.
//!
//! These sit on top of a [`ClientDirectory`] and a [`TokenIssuer`] and never
//! touch HTTP types, so the API layer is only responsible for mapping
//! [`AuthError`] to responses.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use mqgate_core::{ClientId, DomainError};

use crate::client::ClientRecord;
use crate::directory::{ClientDirectory, DirectoryError};
use crate::jwt::{JwtError, TokenIssuer};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("client not found")]
    ClientNotFound,

    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error(transparent)]
    Directory(DirectoryError),

    #[error(transparent)]
    Token(#[from] JwtError),
}

impl From<DirectoryError> for AuthError {
    fn from(value: DirectoryError) -> Self {
        match value {
            DirectoryError::NotFound => AuthError::ClientNotFound,
            other => AuthError::Directory(other),
        }
    }
}

/// Exchange an API key for a signed bearer token.
pub async fn authenticate_client(
    directory: &dyn ClientDirectory,
    issuer: &dyn TokenIssuer,
    api_key: &str,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let Some(client) = directory.find_by_api_key(api_key).await? else {
        warn!("client not authenticated: api key is invalid or missing");
        return Err(AuthError::ClientNotFound);
    };

    let token = issuer.issue(&client, now)?;
    info!(client_id = %client.id, "issued access token");
    Ok(token)
}

/// Register a new client under a freshly generated API key.
pub async fn register_client(
    directory: &dyn ClientDirectory,
    name: &str,
) -> Result<ClientRecord, AuthError> {
    let record = ClientRecord::register(name)?;
    let created = directory.create(record).await?;
    info!(client_id = %created.id, "client registered");
    Ok(created)
}

/// Rename a client. The API key is rotated on every update.
pub async fn update_client(
    directory: &dyn ClientDirectory,
    id: ClientId,
    name: &str,
) -> Result<ClientRecord, AuthError> {
    let existing = directory
        .find_by_id(id)
        .await?
        .ok_or(AuthError::ClientNotFound)?;
    let updated = directory.update(existing.renamed(name)?).await?;
    info!(client_id = %id, "client updated, api key rotated");
    Ok(updated)
}

pub async fn remove_client(directory: &dyn ClientDirectory, id: ClientId) -> Result<(), AuthError> {
    if directory.find_by_id(id).await?.is_none() {
        warn!(client_id = %id, "delete requested for unknown client");
        return Err(AuthError::ClientNotFound);
    }
    directory.delete(id).await?;
    info!(client_id = %id, "client deleted");
    Ok(())
}
