//! Infrastructure layer: broker bridge, storage adapters, configuration.

pub mod bridge;
pub mod broker;
pub mod config;
pub mod directory;

pub use bridge::{BridgeError, BridgeOutcome, BridgeSession, BrokerBridge, SessionState};
pub use broker::{BrokerLink, BrokerTransport, InMemoryBroker, LapinTransport, LinkError};
pub use config::{ConfigError, GatewayConfig};
pub use directory::PostgresClientDirectory;
