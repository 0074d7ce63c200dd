//! Service wiring: broker bridge, client directory, token issuer.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use mqgate_auth::{ClientDirectory, Hs256TokenIssuer, InMemoryClientDirectory, TokenIssuer};
use mqgate_infra::{BrokerBridge, GatewayConfig, LapinTransport, PostgresClientDirectory};

/// Shared, read-only handles. Nothing here carries per-request broker state.
#[derive(Clone)]
pub struct AppServices {
    pub bridge: BrokerBridge,
    pub directory: Arc<dyn ClientDirectory>,
    pub issuer: Arc<dyn TokenIssuer>,
}

impl AppServices {
    pub fn new(
        bridge: BrokerBridge,
        directory: Arc<dyn ClientDirectory>,
        issuer: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            bridge,
            directory,
            issuer,
        }
    }
}

/// Production wiring from configuration.
pub async fn build_services(config: &GatewayConfig) -> anyhow::Result<AppServices> {
    let bridge = BrokerBridge::new(Arc::new(LapinTransport::new()))
        .with_connect_timeout(config.broker_connect_timeout);

    let directory: Arc<dyn ClientDirectory> = match &config.database_url {
        Some(url) => {
            let directory = PostgresClientDirectory::connect(url)
                .await
                .context("failed to open postgres client directory")?;
            info!("client directory: postgres");
            Arc::new(directory)
        }
        None => {
            warn!("DATABASE_URL not set; client records are kept in memory");
            Arc::new(InMemoryClientDirectory::new())
        }
    };

    let issuer = Arc::new(Hs256TokenIssuer::new(config.jwt_secret.as_bytes(), config.token_ttl));

    Ok(AppServices::new(bridge, directory, issuer))
}
