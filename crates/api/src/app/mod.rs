//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: bridge, client directory and token issuer
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use mqgate_auth::Hs256JwtValidator;
use mqgate_infra::GatewayConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &GatewayConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config).await?;
    Ok(build_router(services, &config.jwt_secret))
}

/// Router over already-built services. Tests inject in-memory backends here.
pub fn build_router(services: AppServices, jwt_secret: &str) -> Router {
    let jwt = Arc::new(Hs256JwtValidator::new(jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState { jwt };

    // Protected routes: bearer token required before any broker access.
    let protected = routes::protected_router().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .merge(routes::public_router())
        .merge(protected)
        .layer(Extension(Arc::new(services)))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
