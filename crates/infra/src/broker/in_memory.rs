//! In-process broker.
//!
//! Intended for tests/dev. Queues live in memory keyed by `(vhost, queue)`,
//! and the broker counts every connection and channel it opens and closes,
//! so callers can assert that cleanup ran exactly once. A missing queue on a
//! passive check faults the channel, as a real AMQP broker does.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use mqgate_core::{BrokerConnectionParams, QueueName};

use super::{BrokerLink, BrokerTransport, LinkError};

/// Step at which an injected failure fires.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    Connect,
    OpenChannel,
    CheckQueue,
    Publish,
    Get,
    CloseChannel,
    CloseConnection,
}

/// Lifetime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrokerStats {
    pub connections_opened: u64,
    pub connections_closed: u64,
    pub channels_opened: u64,
    pub channels_closed: u64,
}

impl BrokerStats {
    pub fn open_connections(&self) -> u64 {
        self.connections_opened - self.connections_closed
    }
}

#[derive(Debug, Default)]
struct BrokerState {
    vhosts: HashSet<String>,
    queues: HashMap<(String, String), VecDeque<Vec<u8>>>,
    credentials: Option<(String, String)>,
    faults: HashSet<FaultPoint>,
    connect_delay: Option<Duration>,
    stats: BrokerStats,
}

/// Shared handle; clones see the same queues and counters.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl InMemoryBroker {
    /// Broker with the default `/` vhost and no credential check.
    pub fn new() -> Self {
        let broker = Self::default();
        broker.add_vhost("/");
        broker
    }

    fn state(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Only accept this user/password pair.
    pub fn with_credentials(self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.state().credentials = Some((user.into(), password.into()));
        self
    }

    /// Delay every connect, for exercising timeouts.
    pub fn with_connect_delay(self, delay: Duration) -> Self {
        self.state().connect_delay = Some(delay);
        self
    }

    pub fn add_vhost(&self, vhost: impl Into<String>) {
        self.state().vhosts.insert(vhost.into());
    }

    /// Create a queue (the bridge itself never does).
    pub fn declare_queue(&self, vhost: &str, queue: &str) {
        let mut state = self.state();
        state.vhosts.insert(vhost.to_string());
        state
            .queues
            .entry((vhost.to_string(), queue.to_string()))
            .or_default();
    }

    pub fn delete_queue(&self, vhost: &str, queue: &str) {
        self.state()
            .queues
            .remove(&(vhost.to_string(), queue.to_string()));
    }

    /// Messages waiting in a queue, `None` if it does not exist.
    pub fn depth(&self, vhost: &str, queue: &str) -> Option<usize> {
        self.state()
            .queues
            .get(&(vhost.to_string(), queue.to_string()))
            .map(VecDeque::len)
    }

    /// Make every subsequent call at `point` fail until cleared.
    pub fn inject_fault(&self, point: FaultPoint) {
        self.state().faults.insert(point);
    }

    pub fn clear_faults(&self) {
        self.state().faults.clear();
    }

    pub fn stats(&self) -> BrokerStats {
        self.state().stats
    }

    fn faulted(&self, point: FaultPoint) -> bool {
        self.state().faults.contains(&point)
    }
}

#[async_trait]
impl BrokerTransport for InMemoryBroker {
    async fn connect(&self, params: &BrokerConnectionParams) -> Result<Box<dyn BrokerLink>, LinkError> {
        let delay = self.state().connect_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if state.faults.contains(&FaultPoint::Connect) {
            return Err(LinkError::Transport("connection refused".to_string()));
        }
        if let Some((user, password)) = &state.credentials {
            if user != params.user() || password != params.password() {
                return Err(LinkError::Transport("ACCESS_REFUSED - login refused".to_string()));
            }
        }
        if !state.vhosts.contains(params.vhost()) {
            return Err(LinkError::Transport(format!(
                "NOT_ALLOWED - vhost {} not found",
                params.vhost()
            )));
        }
        state.stats.connections_opened += 1;

        Ok(Box::new(InMemoryLink {
            broker: self.clone(),
            vhost: params.vhost().to_string(),
            channel: ChannelState::None,
            connection_open: true,
        }))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ChannelState {
    None,
    Open,
    Faulted,
}

struct InMemoryLink {
    broker: InMemoryBroker,
    vhost: String,
    channel: ChannelState,
    connection_open: bool,
}

impl InMemoryLink {
    fn key(&self, queue: &QueueName) -> (String, String) {
        (self.vhost.clone(), queue.as_str().to_string())
    }

    fn usable_channel(&self) -> Result<(), LinkError> {
        match self.channel {
            ChannelState::Open => Ok(()),
            ChannelState::Faulted => Err(LinkError::ChannelClosed("channel closed by broker".to_string())),
            ChannelState::None => Err(LinkError::ChannelClosed("no channel open".to_string())),
        }
    }
}

#[async_trait]
impl BrokerLink for InMemoryLink {
    async fn open_channel(&mut self) -> Result<(), LinkError> {
        if self.broker.faulted(FaultPoint::OpenChannel) {
            return Err(LinkError::ChannelClosed("channel.open refused".to_string()));
        }
        self.broker.state().stats.channels_opened += 1;
        self.channel = ChannelState::Open;
        Ok(())
    }

    async fn check_queue(&mut self, queue: &QueueName) -> Result<(), LinkError> {
        self.usable_channel()?;
        if self.broker.faulted(FaultPoint::CheckQueue) {
            self.channel = ChannelState::Faulted;
            return Err(LinkError::ChannelClosed("channel error during queue.declare".to_string()));
        }
        let exists = self.broker.state().queues.contains_key(&self.key(queue));
        if !exists {
            self.channel = ChannelState::Faulted;
            return Err(LinkError::NotFound(format!(
                "NOT_FOUND - no queue '{}' in vhost '{}'",
                queue, self.vhost
            )));
        }
        Ok(())
    }

    async fn publish(&mut self, queue: &QueueName, payload: &[u8]) -> Result<(), LinkError> {
        self.usable_channel()?;
        if self.broker.faulted(FaultPoint::Publish) {
            return Err(LinkError::Transport("connection reset during publish".to_string()));
        }
        let key = self.key(queue);
        // Default exchange semantics: unroutable messages are silently dropped.
        if let Some(q) = self.broker.state().queues.get_mut(&key) {
            q.push_back(payload.to_vec());
        }
        Ok(())
    }

    async fn get(&mut self, queue: &QueueName) -> Result<Option<Vec<u8>>, LinkError> {
        self.usable_channel()?;
        if self.broker.faulted(FaultPoint::Get) {
            return Err(LinkError::Transport("connection reset during basic.get".to_string()));
        }
        let key = self.key(queue);
        let popped = self
            .broker
            .state()
            .queues
            .get_mut(&key)
            .map(VecDeque::pop_front);
        match popped {
            Some(message) => Ok(message),
            None => {
                self.channel = ChannelState::Faulted;
                Err(LinkError::NotFound(format!("NOT_FOUND - no queue '{queue}'")))
            }
        }
    }

    async fn close_channel(&mut self) -> Result<(), LinkError> {
        let previous = std::mem::replace(&mut self.channel, ChannelState::None);
        match previous {
            ChannelState::None => Ok(()),
            ChannelState::Faulted => Err(LinkError::ChannelClosed("channel already closed by broker".to_string())),
            ChannelState::Open => {
                if self.broker.faulted(FaultPoint::CloseChannel) {
                    return Err(LinkError::Transport("channel.close timed out".to_string()));
                }
                self.broker.state().stats.channels_closed += 1;
                Ok(())
            }
        }
    }

    async fn close_connection(&mut self) -> Result<(), LinkError> {
        if !self.connection_open {
            return Ok(());
        }
        self.connection_open = false;
        // The socket is gone either way; a failed close handshake is still counted.
        self.broker.state().stats.connections_closed += 1;
        if self.broker.faulted(FaultPoint::CloseConnection) {
            return Err(LinkError::Transport("connection.close timed out".to_string()));
        }
        Ok(())
    }
}
