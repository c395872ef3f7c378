use crate::hub::protocol::ServerEvent;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Sending half of a connection's outbound queue
pub type OutboundSender = mpsc::Sender<Arc<ServerEvent>>;

/// Receiving half of a connection's outbound queue, drained by the session
pub type OutboundReceiver = mpsc::Receiver<Arc<ServerEvent>>;

/// Process-unique connection identifier (monotonic, never reused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A live client session as seen by the hub
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    outbound: OutboundSender,
}

/// Why a single delivery did not reach a connection's queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// Queue at capacity; the new message was dropped (drop-newest)
    Full,
    /// Receiving side is gone (session ended)
    Closed,
}

impl Connection {
    pub fn new(id: ConnectionId, outbound: OutboundSender) -> Self {
        Self { id, outbound }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Enqueue an event without waiting.
    pub fn try_deliver(&self, event: Arc<ServerEvent>) -> Result<(), DeliveryError> {
        self.outbound.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}
