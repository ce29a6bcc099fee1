//! Relay wire messages
//!
//! Inbound payloads are decoded once into an [`Envelope`] and matched
//! exhaustively by the router. Outbound server messages are [`ServerMessage`].
//!
//! ```text
//! client → server   {type:"chat", message:{...}}
//!                   {offer:...} | {answer:...} | {candidate:...}
//! server → client   {type:"chatHistory", messages:[...]}
//!                   {type:"chat", message:{...}}
//!                   {type:"clientCount", count:n}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// A chat message, as produced by a client
///
/// The relay stores and forwards these untouched; `id` uniqueness is the
/// client's business. Fields beyond the four known ones are kept in `extra`
/// and re-emitted on replay and broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Caller-supplied identifier
    pub id: String,
    /// Message body
    pub text: String,
    /// Opaque per-client identifier
    pub sender: String,
    /// Epoch milliseconds
    pub timestamp: i64,
    /// Any other client-supplied fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// WebRTC signaling kind, determined by which key is present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// SDP offer
    Offer,
    /// SDP answer
    Answer,
    /// ICE candidate
    Candidate,
}

impl SignalKind {
    /// Key that identifies this kind in a payload
    pub fn key(self) -> &'static str {
        match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::Candidate => "candidate",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Discriminant values of the `type` field
pub mod kind {
    pub const CHAT: &str = "chat";
    pub const CHAT_HISTORY: &str = "chatHistory";
    pub const CLIENT_COUNT: &str = "clientCount";
}

/// A decoded inbound payload
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// `{type:"chat", message}`
    Chat(ChatMessage),
    /// `{offer:...}`
    Offer,
    /// `{answer:...}`
    Answer,
    /// `{candidate:...}`
    Candidate,
    /// `{type:"clientCount", ...}` (server-originated shape)
    CountNotify,
    /// `{type:"chatHistory", ...}` (server-originated shape)
    HistoryReplay,
    /// Anything else
    Unknown,
}

impl Envelope {
    /// Decode and classify a raw payload
    ///
    /// Fails only if the bytes are not JSON, or if a `chat` envelope carries a
    /// `message` that is not a [`ChatMessage`]. `type == "chat"` takes
    /// precedence over signaling keys, and signaling keys take precedence over
    /// every other `type`. Signaling keys are checked in the order offer,
    /// answer, candidate.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(payload)?;

        let Value::Object(mut fields) = value else {
            return Ok(Envelope::Unknown);
        };

        let ty = fields.get("type").and_then(Value::as_str);
        if ty != Some(kind::CHAT) {
            return Ok(match (signal_kind(&fields), ty) {
                (Some(SignalKind::Offer), _) => Envelope::Offer,
                (Some(SignalKind::Answer), _) => Envelope::Answer,
                (Some(SignalKind::Candidate), _) => Envelope::Candidate,
                (None, Some(kind::CLIENT_COUNT)) => Envelope::CountNotify,
                (None, Some(kind::CHAT_HISTORY)) => Envelope::HistoryReplay,
                (None, _) => Envelope::Unknown,
            });
        }

        let message = fields.remove("message").unwrap_or(Value::Null);
        Ok(Envelope::Chat(serde_json::from_value(message)?))
    }

    /// Signaling kind, if this is a signaling envelope
    pub fn signal_kind(&self) -> Option<SignalKind> {
        match self {
            Envelope::Offer => Some(SignalKind::Offer),
            Envelope::Answer => Some(SignalKind::Answer),
            Envelope::Candidate => Some(SignalKind::Candidate),
            _ => None,
        }
    }
}

fn signal_kind(fields: &Map<String, Value>) -> Option<SignalKind> {
    [SignalKind::Offer, SignalKind::Answer, SignalKind::Candidate]
        .into_iter()
        .find(|kind| fields.contains_key(kind.key()))
}

/// Messages originated by the relay
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage<'a> {
    /// Backlog sent once to a joining connection
    ChatHistory { messages: &'a [ChatMessage] },
    /// Canonical chat stream entry
    Chat { message: &'a ChatMessage },
    /// Live connection count
    ClientCount { count: usize },
}

impl ServerMessage<'_> {
    /// Encode as a JSON string
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
