use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use super::DeliveryReport;

/// Lifetime counters for the hub
#[derive(Default)]
pub struct HubMetrics {
    /// Inbound messages fanned out
    messages_relayed: AtomicU64,

    /// Successful enqueues across all recipients
    deliveries: AtomicU64,

    /// Drops because a recipient's queue was full
    dropped_full: AtomicU64,

    /// Drops because a recipient had already gone away
    dropped_closed: AtomicU64,

    /// Connections accepted since start
    connections_total: AtomicU64,
}

impl HubMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connect(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one fan-out
    pub fn record_broadcast(&self, report: &DeliveryReport) {
        self.messages_relayed.fetch_add(1, Ordering::Relaxed);
        self.deliveries
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.dropped_full
            .fetch_add(report.dropped_full as u64, Ordering::Relaxed);
        self.dropped_closed
            .fetch_add(report.dropped_closed as u64, Ordering::Relaxed);
    }

    /// Point-in-time view, paired with the live connection count
    pub fn snapshot(&self, connections: usize) -> HubStats {
        HubStats {
            connections,
            connections_total: self.connections_total.load(Ordering::Relaxed),
            messages_relayed: self.messages_relayed.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            dropped_full: self.dropped_full.load(Ordering::Relaxed),
            dropped_closed: self.dropped_closed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of hub metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HubStats {
    pub connections: usize,
    #[serde(rename = "connectionsTotal")]
    pub connections_total: u64,
    #[serde(rename = "messagesRelayed")]
    pub messages_relayed: u64,
    pub deliveries: u64,
    #[serde(rename = "droppedFull")]
    pub dropped_full: u64,
    #[serde(rename = "droppedClosed")]
    pub dropped_closed: u64,
}
