//! Registry error types
//!
//! Per-connection send failures. These are reported to the broadcaster,
//! never raised out of a broadcast.

use super::frame::ConnectionId;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The connection's writer is gone or the connection is closing
    ConnectionClosed(ConnectionId),
    /// The connection's send queue is full (slow peer)
    QueueFull(ConnectionId),
}

impl RegistryError {
    /// Connection the failure belongs to
    pub fn connection_id(&self) -> ConnectionId {
        match self {
            RegistryError::ConnectionClosed(id) | RegistryError::QueueFull(id) => *id,
        }
    }
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::ConnectionClosed(id) => write!(f, "Connection closed: {}", id),
            RegistryError::QueueFull(id) => write!(f, "Send queue full: {}", id),
        }
    }
}

impl std::error::Error for RegistryError {}
