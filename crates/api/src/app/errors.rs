//! Error → HTTP response mapping. Every failure body is `{"error", "message"}`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use mqgate_auth::{AuthError, DirectoryError};
use mqgate_core::DomainError;
use mqgate_infra::BridgeError;

pub fn bridge_error_to_response(err: &BridgeError) -> axum::response::Response {
    match err {
        BridgeError::Connection(_) => {
            json_error(StatusCode::BAD_GATEWAY, "broker_unavailable", err.to_string())
        }
        BridgeError::QueueNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "queue_not_found", err.to_string())
        }
        BridgeError::Publish { .. } => json_error(StatusCode::BAD_GATEWAY, "publish_error", err.to_string()),
        BridgeError::Pull { .. } => json_error(StatusCode::BAD_GATEWAY, "pull_error", err.to_string()),
        BridgeError::Disconnect(_) | BridgeError::SessionClosed | BridgeError::OutOfOrder(_) => {
            tracing::error!(error = %err, "unexpected bridge failure");
            internal_error()
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    match err {
        AuthError::ClientNotFound => json_error(StatusCode::NOT_FOUND, "not_found", "Client not found"),
        AuthError::Validation(e) => domain_error_to_response(e),
        AuthError::Directory(DirectoryError::Conflict(msg)) => {
            json_error(StatusCode::CONFLICT, "conflict", msg)
        }
        AuthError::Directory(e) => {
            tracing::error!(error = %e, "client directory failure");
            internal_error()
        }
        AuthError::Token(e) => {
            tracing::error!(error = %e, "token issuance failed");
            internal_error()
        }
    }
}

/// Malformed or incomplete JSON bodies.
pub fn json_rejection(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text())
}

pub fn internal_error() -> axum::response::Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "internal server error",
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_errors_map_to_documented_statuses() {
        let cases = [
            (BridgeError::Connection("x".into()), StatusCode::BAD_GATEWAY),
            (BridgeError::QueueNotFound("orders".into()), StatusCode::NOT_FOUND),
            (
                BridgeError::Publish { queue: "q".into(), reason: "r".into() },
                StatusCode::BAD_GATEWAY,
            ),
            (
                BridgeError::Pull { queue: "q".into(), reason: "r".into() },
                StatusCode::BAD_GATEWAY,
            ),
            (BridgeError::SessionClosed, StatusCode::INTERNAL_SERVER_ERROR),
            (BridgeError::OutOfOrder("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(bridge_error_to_response(&err).status(), status, "{err:?}");
        }
    }

    #[test]
    fn unknown_client_is_404_and_backend_failure_is_500() {
        assert_eq!(
            auth_error_to_response(AuthError::ClientNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            auth_error_to_response(AuthError::Directory(DirectoryError::Backend("down".into()))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            auth_error_to_response(AuthError::Directory(DirectoryError::Conflict("dup".into()))).status(),
            StatusCode::CONFLICT
        );
    }
}
