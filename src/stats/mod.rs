//! Relay statistics

pub mod metrics;

pub use metrics::{HealthStatus, RelayStats, StatsSnapshot};
