use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use mqgate_auth::{register_client, remove_client, update_client as rename_client};
use mqgate_core::ClientId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn create_client(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::ClientRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match register_client(services.directory.as_ref(), &body.name).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

/// Rename a client; its API key is rotated.
pub async fn update_client(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::ClientRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: ClientId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match rename_client(services.directory.as_ref(), id, &body.name).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn delete_client(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ClientId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match remove_client(services.directory.as_ref(), id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}
