//! Inbound message routing
//!
//! Every payload is decoded once into an [`Envelope`] and handled by one of
//! three policies:
//!
//! - chat: append to history, broadcast `{type:"chat"}` to everyone,
//!   sender included
//! - signaling (offer/answer/candidate): relay the original frame verbatim to
//!   everyone except the sender
//! - anything else: drop
//!
//! Malformed payloads are logged and dropped; the connection stays open.

use tokio::sync::Mutex;

use crate::history::HistoryBuffer;
use crate::protocol::{ChatMessage, Envelope, ServerMessage, SignalKind};
use crate::registry::{BroadcastReport, ConnectionId, ConnectionRegistry, RelayFrame};
use crate::stats::RelayStats;

/// Why a payload was not relayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Not JSON, or a chat envelope without a valid message
    Malformed,
    /// Decoded fine but no policy applies
    Unroutable,
    /// The outbound server message could not be encoded
    Encode,
}

/// Result of routing one payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Chat appended and broadcast to all
    Chat(BroadcastReport),
    /// Signaling relayed to all but the sender
    Signal(SignalKind, BroadcastReport),
    /// Payload dropped
    Dropped(DropReason),
}

/// Classifies inbound payloads and dispatches them via the registry
pub struct Router<'a> {
    registry: &'a ConnectionRegistry,
    history: &'a Mutex<HistoryBuffer>,
    stats: &'a RelayStats,
}

impl<'a> Router<'a> {
    pub fn new(
        registry: &'a ConnectionRegistry,
        history: &'a Mutex<HistoryBuffer>,
        stats: &'a RelayStats,
    ) -> Self {
        Self {
            registry,
            history,
            stats,
        }
    }

    /// Route one inbound frame from `source`
    pub async fn route(&self, source: ConnectionId, frame: RelayFrame) -> RouteOutcome {
        let envelope = match Envelope::decode(frame.as_bytes()) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.stats.record_decode_error();
                tracing::warn!(conn_id = %source, error = %e, bytes = frame.len(), "Dropping malformed message");
                return RouteOutcome::Dropped(DropReason::Malformed);
            }
        };

        match envelope {
            Envelope::Chat(message) => self.chat(source, message).await,
            Envelope::Offer => self.signal(source, SignalKind::Offer, frame).await,
            Envelope::Answer => self.signal(source, SignalKind::Answer, frame).await,
            Envelope::Candidate => self.signal(source, SignalKind::Candidate, frame).await,
            other @ (Envelope::CountNotify | Envelope::HistoryReplay | Envelope::Unknown) => {
                self.stats.record_unroutable();
                tracing::debug!(conn_id = %source, envelope = ?other, "Dropping unroutable message");
                RouteOutcome::Dropped(DropReason::Unroutable)
            }
        }
    }

    async fn chat(&self, source: ConnectionId, message: ChatMessage) -> RouteOutcome {
        let encoded = match (ServerMessage::Chat { message: &message }).encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::error!(conn_id = %source, message_id = %message.id, error = %e, "Failed to encode chat message");
                return RouteOutcome::Dropped(DropReason::Encode);
            }
        };

        let registry = self.registry.read().await;
        let mut history = self.history.lock().await;

        tracing::debug!(conn_id = %source, message_id = %message.id, "Chat message");
        history.append(message);
        let report = registry.broadcast(RelayFrame::text(encoded), None);
        drop(history);

        self.stats.record_chat();
        self.stats.record_send_failures(report.failed.len());
        RouteOutcome::Chat(report)
    }

    async fn signal(&self, source: ConnectionId, kind: SignalKind, frame: RelayFrame) -> RouteOutcome {
        let report = self.registry.broadcast(frame, Some(source)).await;

        tracing::debug!(
            conn_id = %source,
            kind = %kind,
            delivered = report.delivered,
            "Relayed signaling message"
        );

        self.stats.record_signal();
        self.stats.record_send_failures(report.failed.len());
        RouteOutcome::Signal(kind, report)
    }
}
