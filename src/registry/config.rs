//! Registry configuration

/// Default capacity of each connection's outbound queue
pub const DEFAULT_SEND_QUEUE_CAPACITY: usize = 256;

/// Configuration for the connection registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Frames buffered per connection before further sends to it are dropped
    pub send_queue_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            send_queue_capacity: DEFAULT_SEND_QUEUE_CAPACITY,
        }
    }
}

impl RegistryConfig {
    /// Set the per-connection send queue capacity (minimum 1)
    pub fn send_queue_capacity(mut self, capacity: usize) -> Self {
        self.send_queue_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert_eq!(config.send_queue_capacity, DEFAULT_SEND_QUEUE_CAPACITY);
    }

    #[test]
    fn test_send_queue_capacity_floor() {
        let config = RegistryConfig::default().send_queue_capacity(0);
        assert_eq!(config.send_queue_capacity, 1);
    }
}
