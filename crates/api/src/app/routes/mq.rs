//! Gateway entry points: one broker connection per request.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use mqgate_core::{OutboundMessage, QueueName};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ClientContext;

pub async fn send_message(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(client): Extension<ClientContext>,
    body: Result<Json<dto::SendMessageRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };
    let params = match body.connection() {
        Ok(params) => params,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let queue = match QueueName::new(body.queue) {
        Ok(queue) => queue,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let message = OutboundMessage::new(body.message);

    info!(client_id = %client.client_id(), endpoint = %params.endpoint(), %queue, "send requested");

    let outcome = services.bridge.publish_once(&params, &queue, &message).await;
    match outcome.into_result() {
        Ok(()) => Json(dto::SendMessageResponse { success: true }).into_response(),
        Err(e) => errors::bridge_error_to_response(&e),
    }
}

pub async fn receive_message(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(client): Extension<ClientContext>,
    body: Result<Json<dto::ReceiveMessageRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };
    let params = match body.connection() {
        Ok(params) => params,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let queue = match QueueName::new(body.queue) {
        Ok(queue) => queue,
        Err(e) => return errors::domain_error_to_response(e),
    };

    info!(client_id = %client.client_id(), endpoint = %params.endpoint(), %queue, "receive requested");

    let outcome = services.bridge.pull_once(&params, &queue).await;
    match outcome.into_result() {
        Ok(Some(message)) => Json(dto::ReceiveMessageResponse { message }).into_response(),
        // An empty queue is reported to the caller as a failure.
        Ok(None) => errors::json_error(
            StatusCode::NOT_FOUND,
            "no_message",
            "No message received from the queue",
        ),
        Err(e) => errors::bridge_error_to_response(&e),
    }
}
