//! Broker-facing value types.
//!
//! These are supplied per request and never persisted. Each constructor
//! validates its input, so the bridge can assume a well-formed value and
//! never opens a connection for parameters that could not possibly work.

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Longest queue name the AMQP 0-9-1 `shortstr` encoding can carry.
pub const MAX_QUEUE_NAME_LEN: usize = 255;

/// Where and how to reach a broker for one request.
///
/// The password is deliberately left out of the `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct BrokerConnectionParams {
    host: String,
    port: u16,
    user: String,
    password: String,
    vhost: String,
}

impl BrokerConnectionParams {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        vhost: impl Into<String>,
    ) -> DomainResult<Self> {
        let host = host.into().trim().to_string();
        let user = user.into();
        let password = password.into();
        let vhost = vhost.into();

        if host.is_empty() {
            return Err(DomainError::validation("server must not be empty"));
        }
        if host.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("server must not contain whitespace"));
        }
        if port == 0 {
            return Err(DomainError::validation("port must be greater than 0"));
        }
        if user.is_empty() {
            return Err(DomainError::validation("user must not be empty"));
        }
        if password.is_empty() {
            return Err(DomainError::validation("password must not be empty"));
        }
        if vhost.is_empty() {
            return Err(DomainError::validation("vhost must not be empty"));
        }

        Ok(Self {
            host,
            port,
            user,
            password,
            vhost,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn vhost(&self) -> &str {
        &self.vhost
    }

    /// `host:port` for log lines.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl core::fmt::Debug for BrokerConnectionParams {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BrokerConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("vhost", &self.vhost)
            .finish()
    }
}

impl ValueObject for BrokerConnectionParams {}

/// Name of an existing queue. The gateway never declares queues.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueName(String);

impl QueueName {
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("queue must not be empty"));
        }
        if name.len() > MAX_QUEUE_NAME_LEN {
            return Err(DomainError::validation(format!(
                "queue must be at most {MAX_QUEUE_NAME_LEN} bytes"
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for QueueName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ValueObject for QueueName {}

/// Opaque text payload for a single publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage(String);

impl OutboundMessage {
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for OutboundMessage {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl ValueObject for OutboundMessage {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params(port: u16) -> DomainResult<BrokerConnectionParams> {
        BrokerConnectionParams::new("localhost", port, "guest", "guest", "/")
    }

    #[test]
    fn accepts_default_vhost() {
        let p = params(5672).unwrap();
        assert_eq!(p.vhost(), "/");
        assert_eq!(p.endpoint(), "localhost:5672");
    }

    #[test]
    fn rejects_zero_port() {
        assert!(matches!(params(0), Err(DomainError::Validation(_))));
    }

    #[test]
    fn rejects_each_empty_field() {
        let cases = [
            BrokerConnectionParams::new("", 5672, "guest", "guest", "/"),
            BrokerConnectionParams::new("   ", 5672, "guest", "guest", "/"),
            BrokerConnectionParams::new("localhost", 5672, "", "guest", "/"),
            BrokerConnectionParams::new("localhost", 5672, "guest", "", "/"),
            BrokerConnectionParams::new("localhost", 5672, "guest", "guest", ""),
        ];
        for case in cases {
            assert!(matches!(case, Err(DomainError::Validation(_))));
        }
    }

    #[test]
    fn debug_output_hides_password() {
        let p = BrokerConnectionParams::new("mq.internal", 5672, "svc", "s3cr3t", "prod").unwrap();
        let rendered = format!("{p:?}");
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn queue_name_rejects_blank() {
        assert!(QueueName::new("").is_err());
        assert!(QueueName::new(" \t").is_err());
    }

    #[test]
    fn message_exposes_raw_bytes() {
        let m = OutboundMessage::new("héllo");
        assert_eq!(m.as_bytes(), "héllo".as_bytes());
        assert_eq!(m.len(), 6);
    }

    proptest! {
        #[test]
        fn queue_names_up_to_limit_are_accepted(name in "[a-zA-Z0-9._-]{1,255}") {
            let q = QueueName::new(name.clone()).unwrap();
            prop_assert_eq!(q.as_str(), name.as_str());
        }

        #[test]
        fn queue_names_over_limit_are_rejected(name in "[a-z]{256,300}") {
            prop_assert!(QueueName::new(name).is_err());
        }

        #[test]
        fn any_nonzero_port_is_accepted(port in 1u16..=u16::MAX) {
            prop_assert_eq!(params(port).unwrap().port(), port);
        }
    }
}
