//! Statistics and metrics for the relay

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Relay-wide counters
///
/// Updated from every connection task; all counters are relaxed atomics.
#[derive(Debug)]
pub struct RelayStats {
    started_at: Instant,
    total_connections: AtomicU64,
    rejected_connections: AtomicU64,
    chat_messages: AtomicU64,
    signaling_messages: AtomicU64,
    decode_errors: AtomicU64,
    unroutable_messages: AtomicU64,
    send_failures: AtomicU64,
}

impl RelayStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            total_connections: AtomicU64::new(0),
            rejected_connections: AtomicU64::new(0),
            chat_messages: AtomicU64::new(0),
            signaling_messages: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            unroutable_messages: AtomicU64::new(0),
            send_failures: AtomicU64::new(0),
        }
    }

    pub fn record_connection(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chat(&self) {
        self.chat_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_signal(&self) {
        self.signaling_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unroutable(&self) {
        self.unroutable_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_send_failures(&self, count: usize) {
        if count > 0 {
            self.send_failures.fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    /// Time since the relay was created
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uptime: self.uptime(),
            total_connections: self.total_connections.load(Ordering::Relaxed),
            rejected_connections: self.rejected_connections.load(Ordering::Relaxed),
            chat_messages: self.chat_messages.load(Ordering::Relaxed),
            signaling_messages: self.signaling_messages.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            unroutable_messages: self.unroutable_messages.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for RelayStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain copy of [`RelayStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Uptime
    pub uptime: Duration,
    /// Total connections ever accepted
    pub total_connections: u64,
    /// Upgrades refused because of the connection limit
    pub rejected_connections: u64,
    /// Chat messages relayed
    pub chat_messages: u64,
    /// Signaling messages relayed
    pub signaling_messages: u64,
    /// Inbound payloads that failed to decode
    pub decode_errors: u64,
    /// Inbound payloads with no routing policy
    pub unroutable_messages: u64,
    /// Per-peer send failures during broadcasts
    pub send_failures: u64,
}

/// Health check response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// Always "ok" while the process is serving
    pub status: &'static str,
    /// Live connections
    pub client_count: usize,
    /// Retained chat messages
    pub message_count: usize,
}

impl HealthStatus {
    pub fn ok(client_count: usize, message_count: usize) -> Self {
        Self {
            status: "ok",
            client_count,
            message_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_stats_new() {
        let stats = RelayStats::new().snapshot();
        assert_eq!(stats.total_connections, 0);
        assert_eq!(stats.chat_messages, 0);
        assert_eq!(stats.signaling_messages, 0);
        assert_eq!(stats.decode_errors, 0);
        assert_eq!(stats.send_failures, 0);
    }

    #[test]
    fn test_relay_stats_counters() {
        let stats = RelayStats::new();
        stats.record_connection();
        stats.record_connection();
        stats.record_chat();
        stats.record_signal();
        stats.record_decode_error();
        stats.record_unroutable();
        stats.record_rejected();
        stats.record_send_failures(3);
        stats.record_send_failures(0);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_connections, 2);
        assert_eq!(snapshot.chat_messages, 1);
        assert_eq!(snapshot.signaling_messages, 1);
        assert_eq!(snapshot.decode_errors, 1);
        assert_eq!(snapshot.unroutable_messages, 1);
        assert_eq!(snapshot.rejected_connections, 1);
        assert_eq!(snapshot.send_failures, 3);
    }

    #[test]
    fn test_health_status_json() {
        let json = serde_json::to_value(HealthStatus::ok(2, 5)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "ok", "clientCount": 2, "messageCount": 5})
        );
    }
}
