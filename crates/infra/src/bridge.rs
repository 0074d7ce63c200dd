//! Broker bridge: one connection/channel pair per request.
//!
//! A [`BridgeSession`] moves through
//! `Connected -> Verified -> (Published | Pulled) -> Closed`, and `Closed` is
//! reachable from every state. Sessions are never pooled or shared; each
//! request pays the full connection setup.
//!
//! Release is guaranteed three ways:
//! - [`BrokerBridge::publish_once`] / [`BrokerBridge::pull_once`] always run
//!   [`BridgeSession::disconnect`], whatever happened before it.
//! - `disconnect` always attempts the connection close, even when the channel
//!   close fails.
//! - A session dropped while still open (request cancelled, panic) spawns the
//!   close sequence on the current runtime.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, error, info, instrument, warn};

use mqgate_core::{BrokerConnectionParams, OutboundMessage, QueueName};

use crate::broker::{BrokerLink, BrokerTransport, LinkError};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Bridge failure taxonomy.
///
/// `Display` output is safe to show to callers; broker wire detail stays in
/// the `reason` fields and the logs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("failed to connect to broker: {0}")]
    Connection(String),

    #[error("the queue \"{0}\" does not exist")]
    QueueNotFound(String),

    #[error("failed to send message to queue \"{queue}\"")]
    Publish { queue: String, reason: String },

    #[error("failed to receive message from queue \"{queue}\"")]
    Pull { queue: String, reason: String },

    #[error("failed to disconnect from broker: {0}")]
    Disconnect(String),

    #[error("bridge session is already closed")]
    SessionClosed,

    #[error("bridge operation out of order: {0}")]
    OutOfOrder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    Verified(QueueName),
    Published(QueueName),
    Pulled(QueueName),
    Closed,
}

/// Result of a scoped bridge run.
///
/// `disconnect` is reported next to `result`, never in place of it: a failed
/// close does not undo a successful publish or pull.
#[derive(Debug)]
#[must_use]
pub struct BridgeOutcome<T> {
    pub result: Result<T, BridgeError>,
    pub disconnect: Result<(), BridgeError>,
}

impl<T> BridgeOutcome<T> {
    fn not_connected(err: BridgeError) -> Self {
        Self {
            result: Err(err),
            disconnect: Ok(()),
        }
    }

    pub fn into_result(self) -> Result<T, BridgeError> {
        self.result
    }
}

/// Entry point: opens sessions against whatever transport it was built with.
#[derive(Clone)]
pub struct BrokerBridge {
    transport: Arc<dyn BrokerTransport>,
    connect_timeout: Duration,
}

impl BrokerBridge {
    pub fn new(transport: Arc<dyn BrokerTransport>) -> Self {
        Self {
            transport,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Bound for connect + channel open (also used for each close step).
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Open a connection and one channel. No retry.
    ///
    /// Every failure in this phase is reported as [`BridgeError::Connection`];
    /// the distinguishing cause is only logged.
    pub async fn connect(&self, params: &BrokerConnectionParams) -> Result<BridgeSession, BridgeError> {
        let endpoint = params.endpoint();
        info!(%endpoint, vhost = params.vhost(), user = params.user(), "connecting to broker");
        let deadline = Instant::now() + self.connect_timeout;

        let mut link = match timeout_at(deadline, self.transport.connect(params)).await {
            Ok(Ok(link)) => link,
            Ok(Err(e)) => {
                warn!(%endpoint, vhost = params.vhost(), error = %e, "broker connection failed");
                return Err(BridgeError::Connection(format!("could not connect to {endpoint}")));
            }
            Err(_) => {
                warn!(
                    %endpoint,
                    timeout_ms = self.connect_timeout.as_millis() as u64,
                    "broker connection timed out"
                );
                return Err(BridgeError::Connection(format!("timed out connecting to {endpoint}")));
            }
        };

        let channel = match timeout_at(deadline, link.open_channel()).await {
            Ok(opened) => opened.map_err(|e| e.to_string()),
            Err(_) => Err("timed out opening channel".to_string()),
        };
        if let Err(detail) = channel {
            warn!(%endpoint, error = %detail, "failed to open broker channel");
            match timeout(self.connect_timeout, link.close_connection()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!(%endpoint, error = %e, "closing half-open connection failed"),
                Err(_) => debug!(%endpoint, "closing half-open connection timed out"),
            }
            return Err(BridgeError::Connection(format!("could not open a channel on {endpoint}")));
        }

        info!(%endpoint, "connected to broker");
        Ok(BridgeSession {
            link: Some(link),
            state: SessionState::Connected,
            endpoint,
            channel_faulted: false,
            close_timeout: self.connect_timeout,
        })
    }

    /// Connect → verify → publish → disconnect.
    #[instrument(skip_all, fields(endpoint = %params.endpoint(), queue = %queue))]
    pub async fn publish_once(
        &self,
        params: &BrokerConnectionParams,
        queue: &QueueName,
        message: &OutboundMessage,
    ) -> BridgeOutcome<()> {
        let mut session = match self.connect(params).await {
            Ok(session) => session,
            Err(e) => return BridgeOutcome::not_connected(e),
        };

        let result = async {
            session.verify_queue(queue).await?;
            session.publish(queue, message).await
        }
        .await;

        let disconnect = session.disconnect().await;
        BridgeOutcome { result, disconnect }
    }

    /// Connect → verify → pull → disconnect.
    #[instrument(skip_all, fields(endpoint = %params.endpoint(), queue = %queue))]
    pub async fn pull_once(
        &self,
        params: &BrokerConnectionParams,
        queue: &QueueName,
    ) -> BridgeOutcome<Option<String>> {
        let mut session = match self.connect(params).await {
            Ok(session) => session,
            Err(e) => return BridgeOutcome::not_connected(e),
        };

        let result = async {
            session.verify_queue(queue).await?;
            session.pull(queue).await
        }
        .await;

        let disconnect = session.disconnect().await;
        BridgeOutcome { result, disconnect }
    }
}

/// One request's connection + channel.
///
/// Methods take `&mut self`, so operations on a session are strictly
/// sequential.
pub struct BridgeSession {
    link: Option<Box<dyn BrokerLink>>,
    state: SessionState,
    endpoint: String,
    /// Set once the broker has closed (or may have closed) the channel.
    channel_faulted: bool,
    close_timeout: Duration,
}

impl BridgeSession {
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    fn link(&mut self) -> Result<&mut Box<dyn BrokerLink>, BridgeError> {
        self.link.as_mut().ok_or(BridgeError::SessionClosed)
    }

    fn require_verified(&self, queue: &QueueName, op: &str) -> Result<(), BridgeError> {
        match &self.state {
            SessionState::Verified(verified) if verified == queue => Ok(()),
            SessionState::Closed => Err(BridgeError::SessionClosed),
            other => Err(BridgeError::OutOfOrder(format!(
                "{op} on \"{queue}\" requires a prior successful verify_queue (state: {other:?})"
            ))),
        }
    }

    /// Passive existence check. Never creates the queue.
    pub async fn verify_queue(&mut self, queue: &QueueName) -> Result<(), BridgeError> {
        match &self.state {
            SessionState::Connected => {}
            SessionState::Closed => return Err(BridgeError::SessionClosed),
            other => {
                return Err(BridgeError::OutOfOrder(format!(
                    "verify_queue called in state {other:?}"
                )));
            }
        }

        info!(endpoint = %self.endpoint, %queue, "checking if queue exists");
        let checked = self.link()?.check_queue(queue).await;
        match checked {
            Ok(()) => {
                info!(endpoint = %self.endpoint, %queue, "queue exists");
                self.state = SessionState::Verified(queue.clone());
                Ok(())
            }
            Err(LinkError::Transport(detail)) => {
                self.channel_faulted = true;
                warn!(endpoint = %self.endpoint, %queue, error = %detail, "connection lost during queue check");
                Err(BridgeError::Connection(format!("lost connection to {}", self.endpoint)))
            }
            Err(e) => {
                self.channel_faulted = true;
                warn!(endpoint = %self.endpoint, %queue, error = %e, "queue does not exist");
                Err(BridgeError::QueueNotFound(queue.to_string()))
            }
        }
    }

    /// Fire-and-forget publish through the default exchange.
    pub async fn publish(&mut self, queue: &QueueName, message: &OutboundMessage) -> Result<(), BridgeError> {
        self.require_verified(queue, "publish")?;

        info!(endpoint = %self.endpoint, %queue, bytes = message.len(), "sending message to queue");
        let sent = self.link()?.publish(queue, message.as_bytes()).await;
        match sent {
            Ok(()) => {
                info!(endpoint = %self.endpoint, %queue, "message sent to queue");
                self.state = SessionState::Published(queue.clone());
                Ok(())
            }
            Err(e) => {
                self.channel_faulted = true;
                error!(endpoint = %self.endpoint, %queue, error = %e, "failed to send message to queue");
                Err(BridgeError::Publish {
                    queue: queue.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Non-blocking fetch of at most one message, auto-acknowledged.
    ///
    /// `Ok(None)` means the queue was empty at the moment of the call.
    pub async fn pull(&mut self, queue: &QueueName) -> Result<Option<String>, BridgeError> {
        self.require_verified(queue, "pull")?;

        info!(endpoint = %self.endpoint, %queue, "receiving message from queue");
        let fetched = self.link()?.get(queue).await;
        match fetched {
            Ok(Some(body)) => {
                info!(endpoint = %self.endpoint, %queue, bytes = body.len(), "message received from queue");
                self.state = SessionState::Pulled(queue.clone());
                Ok(Some(String::from_utf8_lossy(&body).into_owned()))
            }
            Ok(None) => {
                info!(endpoint = %self.endpoint, %queue, "no message in queue");
                self.state = SessionState::Pulled(queue.clone());
                Ok(None)
            }
            Err(e) => {
                self.channel_faulted = true;
                error!(endpoint = %self.endpoint, %queue, error = %e, "failed to receive message from queue");
                Err(BridgeError::Pull {
                    queue: queue.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Close the channel, then the connection.
    ///
    /// A second call is a no-op. Close errors from a channel the broker has
    /// already torn down are expected and swallowed.
    pub async fn disconnect(&mut self) -> Result<(), BridgeError> {
        let Some(mut link) = self.link.take() else {
            debug!(endpoint = %self.endpoint, "disconnect on a closed session is a no-op");
            return Ok(());
        };
        self.state = SessionState::Closed;

        let mut failures = Vec::new();

        info!(endpoint = %self.endpoint, "disconnecting channel from broker");
        match timeout(self.close_timeout, link.close_channel()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) if self.channel_faulted => {
                debug!(endpoint = %self.endpoint, error = %e, "ignoring close error on faulted channel");
            }
            Ok(Err(e)) => failures.push(format!("channel close: {e}")),
            Err(_) => failures.push("channel close timed out".to_string()),
        }

        info!(endpoint = %self.endpoint, "disconnecting from broker");
        match timeout(self.close_timeout, link.close_connection()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => failures.push(format!("connection close: {e}")),
            Err(_) => failures.push("connection close timed out".to_string()),
        }

        if failures.is_empty() {
            info!(endpoint = %self.endpoint, "disconnected from broker");
            Ok(())
        } else {
            let detail = failures.join("; ");
            error!(endpoint = %self.endpoint, error = %detail, "failed to disconnect from broker");
            Err(BridgeError::Disconnect(detail))
        }
    }
}

impl Drop for BridgeSession {
    fn drop(&mut self) {
        let Some(mut link) = self.link.take() else {
            return;
        };
        warn!(endpoint = %self.endpoint, "bridge session dropped while open; closing in background");

        let close_timeout = self.close_timeout;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let endpoint = self.endpoint.clone();
                let channel_faulted = self.channel_faulted;
                handle.spawn(async move {
                    match timeout(close_timeout, link.close_channel()).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) if channel_faulted => {
                            debug!(%endpoint, error = %e, "ignoring close error on faulted channel");
                        }
                        Ok(Err(e)) => warn!(%endpoint, error = %e, "background channel close failed"),
                        Err(_) => warn!(%endpoint, "background channel close timed out"),
                    }
                    match timeout(close_timeout, link.close_connection()).await {
                        Ok(Ok(())) => debug!(%endpoint, "abandoned session closed"),
                        Ok(Err(e)) => warn!(%endpoint, error = %e, "background connection close failed"),
                        Err(_) => warn!(%endpoint, "background connection close timed out"),
                    }
                });
            }
            Err(_) => {
                warn!("no async runtime available; broker connection dropped without close handshake");
            }
        }
    }
}

impl core::fmt::Debug for BridgeSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BridgeSession")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state)
            .field("channel_faulted", &self.channel_faulted)
            .finish()
    }
}
