//! Connection lifecycle: join and leave
//!
//! ```text
//! CONNECTING ──open()──► OPEN ──close()──► CLOSED
//! ```
//!
//! Graceful close, transport error and abrupt disconnect all end in
//! `close()`. There is no resume; a new socket is a new connection.

use tokio::sync::Mutex;

use crate::history::HistoryBuffer;
use crate::protocol::ServerMessage;
use crate::registry::{
    BroadcastReport, ConnectionEntry, ConnectionId, ConnectionRegistry, RegistryWriteGuard, RelayFrame,
};
use crate::stats::RelayStats;

/// Handles join/leave events against the registry and history
pub struct Lifecycle<'a> {
    registry: &'a ConnectionRegistry,
    history: &'a Mutex<HistoryBuffer>,
    stats: &'a RelayStats,
}

impl<'a> Lifecycle<'a> {
    pub fn new(
        registry: &'a ConnectionRegistry,
        history: &'a Mutex<HistoryBuffer>,
        stats: &'a RelayStats,
    ) -> Self {
        Self {
            registry,
            history,
            stats,
        }
    }

    /// Register a new connection, replay history to it, then notify everyone
    /// of the new count
    ///
    /// Returns the count broadcast, or `None` if the ID was already registered.
    pub async fn open(&self, entry: ConnectionEntry) -> Option<usize> {
        let id = entry.id;
        let peer = entry.peer_addr;

        let mut registry = self.registry.write().await;
        if !registry.register(entry) {
            return None;
        }
        self.stats.record_connection();

        {
            let history = self.history.lock().await;
            if !history.is_empty() {
                let messages = history.snapshot();
                match (ServerMessage::ChatHistory { messages: &messages }).encode() {
                    Ok(encoded) => {
                        if let Err(e) = registry.send_to(id, RelayFrame::text(encoded)) {
                            self.stats.record_send_failures(1);
                            tracing::warn!(conn_id = %id, error = %e, "Failed to replay chat history");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(conn_id = %id, error = %e, "Failed to encode chat history");
                    }
                }
            }
        }

        let count = registry.size();
        tracing::info!(conn_id = %id, peer = %peer, clients = count, "Client connected");
        self.notify_count(&registry);

        Some(count)
    }

    /// Deregister a connection and notify the remaining ones
    ///
    /// Returns the count broadcast, or `None` if the connection was not
    /// registered.
    pub async fn close(&self, id: ConnectionId) -> Option<usize> {
        let mut registry = self.registry.write().await;
        registry.deregister(id)?;

        let count = registry.size();
        tracing::info!(conn_id = %id, clients = count, "Client disconnected");
        self.notify_count(&registry);

        Some(count)
    }

    fn notify_count(&self, registry: &RegistryWriteGuard<'_>) -> BroadcastReport {
        let count = registry.size();
        let encoded = match (ServerMessage::ClientCount { count }).encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode client count");
                return BroadcastReport::default();
            }
        };

        let report = registry.broadcast(RelayFrame::text(encoded), None);
        self.stats.record_send_failures(report.failed.len());
        report
    }
}
