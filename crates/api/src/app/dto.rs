use serde::{Deserialize, Serialize};

use mqgate_core::{BrokerConnectionParams, DomainResult};

// -------------------------
// Request DTOs
// -------------------------

/// `POST /mq/send`. Not `Debug`: carries the broker password.
#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub vhost: String,
    pub queue: String,
    pub message: String,
}

impl SendMessageRequest {
    pub fn connection(&self) -> DomainResult<BrokerConnectionParams> {
        BrokerConnectionParams::new(
            self.server.as_str(),
            self.port,
            self.user.as_str(),
            self.password.as_str(),
            self.vhost.as_str(),
        )
    }
}

/// `POST /mq/receive`.
#[derive(Deserialize)]
pub struct ReceiveMessageRequest {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub vhost: String,
    pub queue: String,
}

impl ReceiveMessageRequest {
    pub fn connection(&self) -> DomainResult<BrokerConnectionParams> {
        BrokerConnectionParams::new(
            self.server.as_str(),
            self.port,
            self.user.as_str(),
            self.password.as_str(),
            self.vhost.as_str(),
        )
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct ClientRequest {
    pub name: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ReceiveMessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_request_uses_wire_field_names() {
        let body = serde_json::json!({
            "server": "localhost",
            "port": 5672,
            "user": "guest",
            "password": "guest",
            "vhost": "/",
            "queue": "orders",
            "message": "hello",
        });
        let req: SendMessageRequest = serde_json::from_value(body).unwrap();
        let params = req.connection().unwrap();
        assert_eq!(params.endpoint(), "localhost:5672");
        assert_eq!(req.message, "hello");
    }

    #[test]
    fn out_of_range_port_is_rejected_at_deserialization() {
        let body = serde_json::json!({
            "server": "localhost",
            "port": 70000,
            "user": "guest",
            "password": "guest",
            "vhost": "/",
            "queue": "orders",
        });
        assert!(serde_json::from_value::<ReceiveMessageRequest>(body).is_err());
    }

    #[test]
    fn login_response_is_camel_case() {
        let json = serde_json::to_value(LoginResponse { access_token: "t".into() }).unwrap();
        assert_eq!(json["accessToken"], "t");
    }
}
