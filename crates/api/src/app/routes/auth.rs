use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    response::IntoResponse,
};
use chrono::Utc;

use mqgate_auth::authenticate_client;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Exchange an API key for a bearer token.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match authenticate_client(
        services.directory.as_ref(),
        services.issuer.as_ref(),
        &body.api_key,
        Utc::now(),
    )
    .await
    {
        Ok(access_token) => Json(dto::LoginResponse { access_token }).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}
