//! Server configuration

use std::net::{Ipv4Addr, SocketAddr};

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::registry::config::DEFAULT_SEND_QUEUE_CAPACITY;
use crate::registry::RegistryConfig;

/// Well-known relay port
pub const DEFAULT_PORT: u16 = 4000;

/// Default maximum inbound WebSocket message size (1 MiB)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Frames buffered per connection before sends to it start failing
    pub send_queue_capacity: usize,

    /// Chat messages retained for replay
    pub history_capacity: usize,

    /// Largest inbound WebSocket message accepted
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            max_connections: 0, // Unlimited
            send_queue_capacity: DEFAULT_SEND_QUEUE_CAPACITY,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set per-connection send queue capacity (minimum 1)
    pub fn send_queue_capacity(mut self, capacity: usize) -> Self {
        self.send_queue_capacity = capacity.max(1);
        self
    }

    /// Set chat history capacity (minimum 1)
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }

    /// Set maximum inbound message size
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Registry-level part of this configuration
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig::default().send_queue_capacity(self.send_queue_capacity)
    }
}
