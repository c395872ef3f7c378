use crate::hub::connection::{ConnectionId, DeliveryError, OutboundReceiver};
use crate::hub::metrics::{HubMetrics, HubStats};
use crate::hub::protocol::ServerEvent;
use crate::hub::registry::ConnectionRegistry;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Outcome of one fan-out. Informational only; never surfaced to the sender.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Connections in the snapshot
    pub recipients: usize,
    pub delivered: usize,
    pub dropped_full: usize,
    pub dropped_closed: usize,
}

/// Broadcast hub: relays every inbound message to every live connection,
/// the sender included
pub struct Hub {
    registry: Arc<ConnectionRegistry>,
    outbound_buffer: usize,
    metrics: HubMetrics,
}

impl Hub {
    /// Create a hub with its own registry. `outbound_buffer` is the per-connection
    /// queue capacity (clamped to at least 1).
    pub fn new(outbound_buffer: usize) -> Self {
        Self::with_registry(Arc::new(ConnectionRegistry::new()), outbound_buffer)
    }

    pub fn with_registry(registry: Arc<ConnectionRegistry>, outbound_buffer: usize) -> Self {
        Self {
            registry,
            outbound_buffer: outbound_buffer.max(1),
            metrics: HubMetrics::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Accept a new connection: allocate its bounded outbound queue and register it.
    ///
    /// The caller owns the receiver and must call [`Hub::disconnect`] when the
    /// session ends.
    pub fn connect(&self) -> (ConnectionId, OutboundReceiver) {
        let (tx, rx) = mpsc::channel(self.outbound_buffer);
        let id = self.registry.register(tx);
        self.metrics.record_connect();

        info!(
            connection_id = %id,
            connections = self.registry.len(),
            "Client connected"
        );

        (id, rx)
    }

    /// Remove a connection. Safe to call more than once.
    pub fn disconnect(&self, id: ConnectionId) {
        if self.registry.unregister(id) {
            info!(
                connection_id = %id,
                connections = self.registry.len(),
                "Client disconnected"
            );
        }
    }

    /// Fan `payload` out to every connection in the current snapshot.
    ///
    /// Never blocks on a recipient: a full queue drops this message for that
    /// recipient only, and a closed one is skipped.
    pub fn on_message(&self, sender: ConnectionId, payload: Value) -> DeliveryReport {
        let recipients = self.registry.snapshot();
        let event = Arc::new(ServerEvent::ReceiveMessage(payload));

        let mut report = DeliveryReport {
            recipients: recipients.len(),
            ..DeliveryReport::default()
        };

        for connection in &recipients {
            match connection.try_deliver(Arc::clone(&event)) {
                Ok(()) => report.delivered += 1,
                Err(DeliveryError::Full) => {
                    report.dropped_full += 1;
                    warn!(
                        connection_id = %connection.id(),
                        sender = %sender,
                        "Outbound queue full, message dropped for recipient"
                    );
                }
                Err(DeliveryError::Closed) => {
                    report.dropped_closed += 1;
                    debug!(
                        connection_id = %connection.id(),
                        sender = %sender,
                        "Recipient closed before delivery"
                    );
                }
            }
        }

        self.metrics.record_broadcast(&report);

        debug!(
            sender = %sender,
            recipients = report.recipients,
            delivered = report.delivered,
            "Message relayed"
        );

        report
    }

    pub fn stats(&self) -> HubStats {
        self.metrics.snapshot(self.registry.len())
    }
}
