//! LAN chat and WebRTC signaling relay
//!
//! A single-process WebSocket relay for a small, trusted set of LAN peers.
//! It does two things:
//!
//! - keeps a bounded chat history (last 100 messages) and replays it to every
//!   client that joins, broadcasting each new chat message to everyone
//! - relays WebRTC signaling (`offer`, `answer`, `candidate`) verbatim to
//!   every client except the sender, so two browsers can negotiate a direct
//!   media connection
//!
//! Every join and leave is followed by a `{type:"clientCount"}` broadcast.
//! Media never passes through the relay.
//!
//! # Example
//!
//! ```no_run
//! use lan_relay::{RelayServer, ServerConfig};
//!
//! # async fn run() -> lan_relay::Result<()> {
//! let server = RelayServer::new(ServerConfig::default());
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await
//! # }
//! ```

pub mod error;
pub mod history;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod server;
pub mod stats;

pub use error::{Error, Result};
pub use history::HistoryBuffer;
pub use protocol::{ChatMessage, Envelope, ServerMessage, SignalKind};
pub use registry::{ConnectionId, ConnectionRegistry, RegistryConfig, RelayFrame};
pub use relay::{Relay, RouteOutcome};
pub use server::{RelayServer, ServerConfig};
pub use stats::{HealthStatus, RelayStats};
