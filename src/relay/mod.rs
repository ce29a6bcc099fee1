//! Relay core
//!
//! [`Relay`] owns the shared state for one server instance: the connection
//! registry, the chat history and the stats counters. The [`Router`] and
//! [`Lifecycle`] borrow it to handle inbound payloads and join/leave events.
//!
//! # Lock order
//!
//! Registry first, then history. Join and leave hold the registry write lock
//! across the whole event; chat holds the registry read lock and the history
//! lock across append and broadcast. A chat is therefore either in a joiner's
//! replay or in its live stream, never both, and every `clientCount` reports
//! a size that existed at a real instant.

pub mod lifecycle;
pub mod router;

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

use crate::history::HistoryBuffer;
use crate::protocol::ChatMessage;
use crate::registry::{ConnectionId, ConnectionRegistry, RegistryConfig};
use crate::stats::{HealthStatus, RelayStats};

pub use lifecycle::Lifecycle;
pub use router::{DropReason, RouteOutcome, Router};

/// Shared relay state
pub struct Relay {
    registry: ConnectionRegistry,
    history: Mutex<HistoryBuffer>,
    stats: RelayStats,
    next_connection_id: AtomicU64,
}

impl Relay {
    /// Create relay state with default registry config and history capacity
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default(), crate::history::DEFAULT_HISTORY_CAPACITY)
    }

    /// Create relay state with custom configuration
    pub fn with_config(registry_config: RegistryConfig, history_capacity: usize) -> Self {
        Self {
            registry: ConnectionRegistry::with_config(registry_config),
            history: Mutex::new(HistoryBuffer::with_capacity(history_capacity)),
            stats: RelayStats::new(),
            next_connection_id: AtomicU64::new(1),
        }
    }

    /// Allocate an ID for a newly accepted connection
    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.next_connection_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Connection registry
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Stats counters
    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }

    /// Router for inbound payloads
    pub fn router(&self) -> Router<'_> {
        Router::new(&self.registry, &self.history, &self.stats)
    }

    /// Join/leave handling
    pub fn lifecycle(&self) -> Lifecycle<'_> {
        Lifecycle::new(&self.registry, &self.history, &self.stats)
    }

    /// Copy of the retained chat history
    pub async fn history_snapshot(&self) -> Vec<ChatMessage> {
        self.history.lock().await.snapshot()
    }

    /// Current health status. Read-only.
    pub async fn health(&self) -> HealthStatus {
        let registry = self.registry.read().await;
        let history = self.history.lock().await;
        HealthStatus::ok(registry.size(), history.len())
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}
