//! Connection entry and state types
//!
//! This module defines the per-connection state stored in the registry.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc::{self, error::TrySendError};

use super::config::RegistryConfig;
use super::error::RegistryError;
use super::frame::{ConnectionId, RelayFrame};

/// State of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Writable, receives broadcasts
    Open,
    /// Writer failed or teardown started; skipped by broadcasts
    Closing,
    /// Deregistered
    Closed,
}

impl ConnectionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ConnectionState::Open,
            1 => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ConnectionState::Open => 0,
            ConnectionState::Closing => 1,
            ConnectionState::Closed => 2,
        }
    }
}

/// Connection state shared between the registry entry and the socket tasks
#[derive(Debug)]
pub struct SharedState(AtomicU8);

impl SharedState {
    fn new() -> Self {
        Self(AtomicU8::new(ConnectionState::Open.as_u8()))
    }

    /// Current state
    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move to `Closing` unless already closed
    pub fn mark_closing(&self) {
        let _ = self.0.compare_exchange(
            ConnectionState::Open.as_u8(),
            ConnectionState::Closing.as_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Move to `Closed`
    pub fn mark_closed(&self) {
        self.0.store(ConnectionState::Closed.as_u8(), Ordering::Release);
    }
}

/// Entry for a single connection in the registry
///
/// Owned by the registry for the connection's lifetime. The socket side keeps
/// only the receiving half of the queue and a handle to the shared state.
#[derive(Debug)]
pub struct ConnectionEntry {
    /// Connection ID
    pub id: ConnectionId,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// When the connection was accepted
    pub connected_at: Instant,

    /// Outbound queue drained by the connection's writer task
    tx: mpsc::Sender<RelayFrame>,

    state: Arc<SharedState>,
}

/// The socket-side half of a connection entry
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Connection ID
    pub id: ConnectionId,
    /// Frames queued for this connection
    pub rx: mpsc::Receiver<RelayFrame>,
    /// State shared with the registry entry
    pub state: Arc<SharedState>,
}

impl ConnectionEntry {
    /// Create an entry and the matching socket-side handle
    pub fn new(
        id: ConnectionId,
        peer_addr: SocketAddr,
        config: &RegistryConfig,
    ) -> (Self, ConnectionHandle) {
        let (tx, rx) = mpsc::channel(config.send_queue_capacity.max(1));
        let state = Arc::new(SharedState::new());

        let entry = Self {
            id,
            peer_addr,
            connected_at: Instant::now(),
            tx,
            state: Arc::clone(&state),
        };
        let handle = ConnectionHandle { id, rx, state };

        (entry, handle)
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Whether the connection currently accepts frames
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Enqueue a frame without waiting
    ///
    /// A full queue or a dropped writer is reported, never awaited.
    pub(super) fn try_send(&self, frame: RelayFrame) -> Result<(), RegistryError> {
        if !self.is_open() {
            return Err(RegistryError::ConnectionClosed(self.id));
        }

        match self.tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(RegistryError::QueueFull(self.id)),
            Err(TrySendError::Closed(_)) => {
                self.state.mark_closing();
                Err(RegistryError::ConnectionClosed(self.id))
            }
        }
    }

    pub(super) fn mark_closed(&self) {
        self.state.mark_closed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:5000".parse().unwrap()
    }

    #[test]
    fn test_new_entry_is_open() {
        let (entry, handle) = ConnectionEntry::new(ConnectionId(1), addr(), &RegistryConfig::default());
        assert!(entry.is_open());
        assert_eq!(handle.state.get(), ConnectionState::Open);
    }

    #[test]
    fn test_try_send_queue_full() {
        let config = RegistryConfig::default().send_queue_capacity(1);
        let (entry, _handle) = ConnectionEntry::new(ConnectionId(1), addr(), &config);

        entry.try_send(RelayFrame::text("a")).unwrap();
        assert_eq!(
            entry.try_send(RelayFrame::text("b")),
            Err(RegistryError::QueueFull(ConnectionId(1)))
        );
        // A full queue does not close the connection
        assert!(entry.is_open());
    }

    #[test]
    fn test_try_send_after_writer_dropped() {
        let (entry, handle) = ConnectionEntry::new(ConnectionId(2), addr(), &RegistryConfig::default());
        drop(handle);

        assert_eq!(
            entry.try_send(RelayFrame::text("a")),
            Err(RegistryError::ConnectionClosed(ConnectionId(2)))
        );
        assert_eq!(entry.state(), ConnectionState::Closing);
    }

    #[test]
    fn test_closing_state_blocks_send() {
        let (entry, handle) = ConnectionEntry::new(ConnectionId(3), addr(), &RegistryConfig::default());
        handle.state.mark_closing();

        assert!(entry.try_send(RelayFrame::text("a")).is_err());
    }

    #[test]
    fn test_closed_is_terminal() {
        let state = SharedState::new();
        state.mark_closed();
        state.mark_closing();
        assert_eq!(state.get(), ConnectionState::Closed);
    }
}
