//! `mqgate-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the validated broker value types and the client identifier.

pub mod broker;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use broker::{BrokerConnectionParams, OutboundMessage, QueueName};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::ClientId;
pub use value_object::ValueObject;
