//! Connection registry implementation
//!
//! The central registry that tracks live connections and fans frames out
//! to them.

use std::collections::HashMap;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::config::RegistryConfig;
use super::entry::ConnectionEntry;
use super::error::RegistryError;
use super::frame::{ConnectionId, RelayFrame};

type ConnectionMap = HashMap<ConnectionId, ConnectionEntry>;

/// Outcome of a broadcast
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections the frame was queued for
    pub delivered: usize,
    /// Per-connection failures (the broadcast continued past each of them)
    pub failed: Vec<RegistryError>,
}

impl BroadcastReport {
    /// Whether every targeted connection accepted the frame
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Central registry of live connections
///
/// Thread-safe via `RwLock`. Broadcasts only need read access; register and
/// deregister take the write lock. Compound operations that must be observed
/// atomically (join, leave, chat fan-out) hold a guard from [`read`] or
/// [`write`] for their whole duration.
///
/// [`read`]: ConnectionRegistry::read
/// [`write`]: ConnectionRegistry::write
pub struct ConnectionRegistry {
    connections: RwLock<ConnectionMap>,
    config: RegistryConfig,
}

impl ConnectionRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Add a connection to the live set
    ///
    /// Returns false (and drops `entry`) if the ID is already registered.
    pub async fn register(&self, entry: ConnectionEntry) -> bool {
        self.write().await.register(entry)
    }

    /// Remove a connection from the live set. No-op if absent.
    pub async fn deregister(&self, id: ConnectionId) -> Option<ConnectionEntry> {
        self.write().await.deregister(id)
    }

    /// Send a frame to every open connection except `exclude`
    pub async fn broadcast(&self, frame: RelayFrame, exclude: Option<ConnectionId>) -> BroadcastReport {
        self.read().await.broadcast(frame, exclude)
    }

    /// Send a frame to a single connection
    pub async fn send_to(&self, id: ConnectionId, frame: RelayFrame) -> Result<(), RegistryError> {
        self.read().await.send_to(id, frame)
    }

    /// Current number of live connections
    pub async fn size(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Acquire shared access for a compound read-side operation
    pub async fn read(&self) -> RegistryReadGuard<'_> {
        RegistryReadGuard {
            connections: self.connections.read().await,
        }
    }

    /// Acquire exclusive access for a compound membership change
    pub async fn write(&self) -> RegistryWriteGuard<'_> {
        RegistryWriteGuard {
            connections: self.connections.write().await,
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared view of the registry
pub struct RegistryReadGuard<'a> {
    connections: RwLockReadGuard<'a, ConnectionMap>,
}

impl RegistryReadGuard<'_> {
    /// Send a frame to every open connection except `exclude`
    pub fn broadcast(&self, frame: RelayFrame, exclude: Option<ConnectionId>) -> BroadcastReport {
        fan_out(&self.connections, frame, exclude)
    }

    /// Send a frame to a single connection
    pub fn send_to(&self, id: ConnectionId, frame: RelayFrame) -> Result<(), RegistryError> {
        send_one(&self.connections, id, frame)
    }

    /// Number of live connections
    pub fn size(&self) -> usize {
        self.connections.len()
    }
}

/// Exclusive view of the registry
pub struct RegistryWriteGuard<'a> {
    connections: RwLockWriteGuard<'a, ConnectionMap>,
}

impl RegistryWriteGuard<'_> {
    /// Add a connection. Returns false if it was already present.
    pub fn register(&mut self, entry: ConnectionEntry) -> bool {
        if self.connections.contains_key(&entry.id) {
            tracing::debug!(conn_id = %entry.id, "Connection already registered");
            return false;
        }

        tracing::debug!(conn_id = %entry.id, peer = %entry.peer_addr, "Connection registered");
        self.connections.insert(entry.id, entry);
        true
    }

    /// Remove a connection and mark it closed. No-op if absent.
    pub fn deregister(&mut self, id: ConnectionId) -> Option<ConnectionEntry> {
        let entry = self.connections.remove(&id)?;
        entry.mark_closed();

        tracing::debug!(
            conn_id = %id,
            connected_for_ms = entry.connected_at.elapsed().as_millis() as u64,
            "Connection deregistered"
        );
        Some(entry)
    }

    /// Send a frame to every open connection except `exclude`
    pub fn broadcast(&self, frame: RelayFrame, exclude: Option<ConnectionId>) -> BroadcastReport {
        fan_out(&self.connections, frame, exclude)
    }

    /// Send a frame to a single connection
    pub fn send_to(&self, id: ConnectionId, frame: RelayFrame) -> Result<(), RegistryError> {
        send_one(&self.connections, id, frame)
    }

    /// Number of live connections
    pub fn size(&self) -> usize {
        self.connections.len()
    }
}

fn send_one(
    connections: &ConnectionMap,
    id: ConnectionId,
    frame: RelayFrame,
) -> Result<(), RegistryError> {
    connections
        .get(&id)
        .ok_or(RegistryError::ConnectionClosed(id))?
        .try_send(frame)
}

fn fan_out(connections: &ConnectionMap, frame: RelayFrame, exclude: Option<ConnectionId>) -> BroadcastReport {
    let mut report = BroadcastReport::default();

    for entry in connections.values() {
        if Some(entry.id) == exclude || !entry.is_open() {
            continue;
        }

        match entry.try_send(frame.clone()) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                tracing::warn!(conn_id = %entry.id, error = %e, "Broadcast to peer failed");
                report.failed.push(e);
            }
        }
    }

    report
}
