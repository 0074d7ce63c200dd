//! AMQP 0-9-1 transport backed by `lapin`.
//!
//! Every call maps to exactly one protocol primitive: `connection.open`,
//! `channel.open`, passive `queue.declare`, `basic.publish` on the default
//! exchange, `basic.get` with `no-ack`, `channel.close`, `connection.close`.

use async_trait::async_trait;
use lapin::options::{BasicGetOptions, BasicPublishOptions, QueueDeclareOptions};
use lapin::protocol::{AMQPErrorKind, AMQPSoftError};
use lapin::types::FieldTable;
use lapin::uri::{AMQPAuthority, AMQPScheme, AMQPUri, AMQPUserInfo};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};

use mqgate_core::{BrokerConnectionParams, QueueName};

use super::{BrokerLink, BrokerTransport, LinkError};

const REPLY_SUCCESS: u16 = 200;

/// Production transport: one fresh TCP connection per call to `connect`.
#[derive(Clone, Default)]
pub struct LapinTransport {
    properties: ConnectionProperties,
}

impl LapinTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_properties(properties: ConnectionProperties) -> Self {
        Self { properties }
    }
}

/// Build the URI structurally so user, password and vhost need no escaping.
fn amqp_uri(params: &BrokerConnectionParams) -> AMQPUri {
    AMQPUri {
        scheme: AMQPScheme::AMQP,
        authority: AMQPAuthority {
            userinfo: AMQPUserInfo {
                username: params.user().to_string(),
                password: params.password().to_string(),
            },
            host: params.host().to_string(),
            port: params.port(),
        },
        vhost: params.vhost().to_string(),
        ..Default::default()
    }
}

fn classify(err: lapin::Error) -> LinkError {
    match &err {
        lapin::Error::ProtocolError(amqp) => match amqp.kind() {
            AMQPErrorKind::Soft(AMQPSoftError::NOTFOUND) => LinkError::NotFound(amqp.to_string()),
            AMQPErrorKind::Soft(_) => LinkError::ChannelClosed(amqp.to_string()),
            _ => LinkError::Transport(amqp.to_string()),
        },
        lapin::Error::InvalidChannelState(_) => LinkError::ChannelClosed(err.to_string()),
        _ => LinkError::Transport(err.to_string()),
    }
}

#[async_trait]
impl BrokerTransport for LapinTransport {
    async fn connect(&self, params: &BrokerConnectionParams) -> Result<Box<dyn BrokerLink>, LinkError> {
        let connection = Connection::connect_uri(amqp_uri(params), self.properties.clone())
            .await
            .map_err(|e| LinkError::Transport(e.to_string()))?;

        Ok(Box::new(LapinLink {
            connection,
            channel: None,
        }))
    }
}

struct LapinLink {
    connection: Connection,
    channel: Option<Channel>,
}

impl LapinLink {
    fn channel(&self) -> Result<&Channel, LinkError> {
        self.channel
            .as_ref()
            .ok_or_else(|| LinkError::ChannelClosed("no channel open".to_string()))
    }
}

#[async_trait]
impl BrokerLink for LapinLink {
    async fn open_channel(&mut self) -> Result<(), LinkError> {
        let channel = self.connection.create_channel().await.map_err(classify)?;
        self.channel = Some(channel);
        Ok(())
    }

    async fn check_queue(&mut self, queue: &QueueName) -> Result<(), LinkError> {
        let options = QueueDeclareOptions {
            passive: true,
            ..Default::default()
        };
        self.channel()?
            .queue_declare(queue.as_str(), options, FieldTable::default())
            .await
            .map(|_| ())
            .map_err(classify)
    }

    async fn publish(&mut self, queue: &QueueName, payload: &[u8]) -> Result<(), LinkError> {
        // No publisher confirms: the returned confirm future is dropped.
        self.channel()?
            .basic_publish(
                "",
                queue.as_str(),
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default(),
            )
            .await
            .map(|_confirm| ())
            .map_err(classify)
    }

    async fn get(&mut self, queue: &QueueName) -> Result<Option<Vec<u8>>, LinkError> {
        let message = self
            .channel()?
            .basic_get(queue.as_str(), BasicGetOptions { no_ack: true })
            .await
            .map_err(classify)?;
        Ok(message.map(|m| m.delivery.data))
    }

    async fn close_channel(&mut self) -> Result<(), LinkError> {
        match self.channel.take() {
            Some(channel) => channel.close(REPLY_SUCCESS, "OK").await.map_err(classify),
            None => Ok(()),
        }
    }

    async fn close_connection(&mut self) -> Result<(), LinkError> {
        self.connection
            .close(REPLY_SUCCESS, "OK")
            .await
            .map_err(|e| LinkError::Transport(e.to_string()))
    }
}
