//! Connection registry for relay fan-out
//!
//! The registry owns every live connection's outbound queue and delivers
//! frames to them. Each connection has its own bounded `mpsc` queue drained
//! by a dedicated writer task, so a slow or dead peer only ever costs a
//! failed `try_send` on the broadcasting side.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<ConnectionRegistry>
//!                  ┌─────────────────────────────┐
//!                  │ connections: HashMap<Id,    │
//!                  │   ConnectionEntry {         │
//!                  │     tx: mpsc::Sender,       │
//!                  │     state: Open|Closing..,  │
//!                  │   }                         │
//!                  │ >                           │
//!                  └──────────────┬──────────────┘
//!                                 │ broadcast(frame, exclude)
//!         ┌───────────────────────┼───────────────────────┐
//!         ▼                       ▼                       ▼
//!    [writer #1]             [writer #2]             [writer #3]
//!    rx.recv()               rx.recv()               rx.recv()
//!         │                       │                       │
//!         └──► sink.send() ──► WebSocket ◄── sink.send() ◄┘
//! ```
//!
//! # Zero-Copy Fan-Out
//!
//! `RelayFrame` wraps reference-counted buffers, so cloning a frame for each
//! peer only bumps a reference count.

pub mod config;
pub mod entry;
pub mod error;
pub mod frame;
pub mod store;

pub use config::RegistryConfig;
pub use entry::{ConnectionEntry, ConnectionHandle, ConnectionState, SharedState};
pub use error::RegistryError;
pub use frame::{ConnectionId, RelayFrame};
pub use store::{BroadcastReport, ConnectionRegistry, RegistryReadGuard, RegistryWriteGuard};
