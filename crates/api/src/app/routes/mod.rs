use axum::{
    Router,
    routing::{get, post, put},
};

pub mod auth;
pub mod clients;
pub mod mq;
pub mod system;

/// Endpoints that require a bearer token.
pub fn protected_router() -> Router {
    Router::new()
        .route("/mq/send", post(mq::send_message))
        .route("/mq/receive", post(mq::receive_message))
}

/// Endpoints open to any caller: health, login and client management.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/authenticate-client/login", post(auth::login))
        .route("/clients", post(clients::create_client))
        .route(
            "/clients/:id",
            put(clients::update_client).delete(clients::delete_client),
        )
}
