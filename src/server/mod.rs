//! Relay server: listener, per-connection handling and health check

pub mod config;
pub mod connection;
pub mod health;
pub mod listener;

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::relay::Relay;

pub use config::ServerConfig;
pub use connection::Connection;
pub use listener::RelayServer;

/// State shared with the HTTP handlers
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) relay: Arc<Relay>,
    pub(crate) config: Arc<ServerConfig>,
    pub(crate) connection_semaphore: Option<Arc<Semaphore>>,
}
