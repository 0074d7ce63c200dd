use axum::http::StatusCode;

pub const HEALTH_MESSAGE: &str = "API - mqgate is running!";

pub async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, HEALTH_MESSAGE)
}
