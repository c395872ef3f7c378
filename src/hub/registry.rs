use crate::hub::connection::{Connection, ConnectionId, OutboundSender};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Registry of live connections
///
/// The only shared mutable state of the hub. `snapshot` copies the handles out
/// so fan-out never runs under a shard lock.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Connection>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add a connection and return its newly assigned id
    pub fn register(&self, outbound: OutboundSender) -> ConnectionId {
        let id = ConnectionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.connections.insert(id, Connection::new(id, outbound));
        id
    }

    /// Remove a connection. Returns false (and does nothing) if it was already gone.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        self.connections.remove(&id).is_some()
    }

    /// Current membership, cloned out of the map
    pub fn snapshot(&self) -> Vec<Connection> {
        self.connections
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;
    use tokio::sync::mpsc;

    fn sender() -> OutboundSender {
        mpsc::channel(1).0
    }

    fn snapshot_ids(registry: &ConnectionRegistry) -> HashSet<ConnectionId> {
        registry.snapshot().iter().map(|c| c.id()).collect()
    }

    #[test]
    fn test_register_assigns_unique_ids() {
        let registry = ConnectionRegistry::new();

        let a = registry.register(sender());
        let b = registry.register(sender());
        let c = registry.register(sender());

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(registry.len(), 3);
        assert_eq!(snapshot_ids(&registry), HashSet::from([a, b, c]));
    }

    #[test]
    fn test_ids_not_reused_after_unregister() {
        let registry = ConnectionRegistry::new();

        let a = registry.register(sender());
        registry.unregister(a);
        let b = registry.register(sender());

        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_unregister_removes_from_snapshot() {
        let registry = ConnectionRegistry::new();

        let a = registry.register(sender());
        let b = registry.register(sender());

        assert!(registry.unregister(a));
        assert!(!registry.contains(a));
        assert_eq!(snapshot_ids(&registry), HashSet::from([b]));
    }

    #[test]
    fn test_unregister_idempotent() {
        let registry = ConnectionRegistry::new();

        let a = registry.register(sender());
        let b = registry.register(sender());

        assert!(registry.unregister(a));
        let after_once = snapshot_ids(&registry);

        assert!(!registry.unregister(a));
        assert_eq!(snapshot_ids(&registry), after_once);
        assert_eq!(after_once, HashSet::from([b]));
    }

    #[test]
    fn test_unregister_unknown_id() {
        let registry = ConnectionRegistry::new();
        registry.register(sender());

        assert!(!registry.unregister(ConnectionId::new(999)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_registry() {
        let registry = ConnectionRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn test_concurrent_register_unregister() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut handles = vec![];

        // Each thread registers 100 connections and unregisters every other one,
        // while snapshots are taken concurrently
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                let mut kept = Vec::new();
                for i in 0..100 {
                    let id = registry.register(sender());
                    if i % 2 == 0 {
                        registry.unregister(id);
                        registry.unregister(id);
                    } else {
                        kept.push(id);
                    }
                    let _ = registry.snapshot();
                }
                kept
            }));
        }

        let mut expected = HashSet::new();
        for handle in handles {
            expected.extend(handle.join().unwrap());
        }

        assert_eq!(expected.len(), 400);
        assert_eq!(registry.len(), 400);
        assert_eq!(snapshot_ids(&registry), expected);
    }
}
