//! Broker transport seam.
//!
//! The bridge speaks to a broker only through these two traits. One
//! `BrokerLink` is one connection plus at most one channel; it is owned by a
//! single [`crate::bridge::BridgeSession`] and never shared.
//!
//! Implementations:
//! - [`amqp::LapinTransport`]: AMQP 0-9-1 over `lapin` (production).
//! - [`in_memory::InMemoryBroker`]: queues in process memory with fault
//!   injection and close counters (dev/test).

use async_trait::async_trait;
use thiserror::Error;

use mqgate_core::{BrokerConnectionParams, QueueName};

pub mod amqp;
pub mod in_memory;

pub use amqp::LapinTransport;
pub use in_memory::{BrokerStats, FaultPoint, InMemoryBroker};

/// Failure reported by a transport or link, already classified.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The broker reported that the queue does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The channel was closed by the broker or is unusable.
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    /// Network, handshake or authentication failure.
    #[error("transport: {0}")]
    Transport(String),
}

/// Opens connections to a broker.
#[async_trait]
pub trait BrokerTransport: Send + Sync {
    /// Open and authenticate a connection scoped to `params.vhost()`.
    ///
    /// No channel is open yet when this returns.
    async fn connect(&self, params: &BrokerConnectionParams) -> Result<Box<dyn BrokerLink>, LinkError>;
}

/// One live connection and its (single) channel.
///
/// Methods take `&mut self`: a link is driven by one task, one call at a time.
#[async_trait]
pub trait BrokerLink: Send {
    async fn open_channel(&mut self) -> Result<(), LinkError>;

    /// Passive queue declare: succeeds only if `queue` already exists.
    async fn check_queue(&mut self, queue: &QueueName) -> Result<(), LinkError>;

    /// Publish through the default exchange with `queue` as routing key.
    async fn publish(&mut self, queue: &QueueName, payload: &[u8]) -> Result<(), LinkError>;

    /// Fetch at most one message with automatic acknowledgement.
    async fn get(&mut self, queue: &QueueName) -> Result<Option<Vec<u8>>, LinkError>;

    async fn close_channel(&mut self) -> Result<(), LinkError>;

    async fn close_connection(&mut self) -> Result<(), LinkError>;
}
