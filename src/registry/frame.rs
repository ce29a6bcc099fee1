//! Relay frame types
//!
//! This module defines the connection identifier and the frames that are
//! fanned out to connections.

use axum::extract::ws::{Message, Utf8Bytes};
use bytes::Bytes;

/// Unique identifier for a connection, assigned at accept time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A frame to be delivered to one or more connections
///
/// Cheap to clone: both variants are reference counted, so every peer in a
/// broadcast shares the same allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayFrame {
    /// UTF-8 text frame
    Text(Utf8Bytes),
    /// Binary frame (signaling that arrived as binary is relayed as binary)
    Binary(Bytes),
}

impl RelayFrame {
    /// Create a text frame from an encoded string
    pub fn text(s: impl Into<String>) -> Self {
        RelayFrame::Text(Utf8Bytes::from(s.into()))
    }

    /// Raw payload bytes
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RelayFrame::Text(t) => t.as_str().as_bytes(),
            RelayFrame::Binary(b) => b,
        }
    }

    /// Payload length in bytes
    pub(crate) fn len(&self) -> usize {
        self.as_bytes().len()
    }
}

impl From<RelayFrame> for Message {
    fn from(frame: RelayFrame) -> Self {
        match frame {
            RelayFrame::Text(t) => Message::Text(t),
            RelayFrame::Binary(b) => Message::Binary(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_frame_into_message() {
        let frame = RelayFrame::text(r#"{"type":"clientCount","count":1}"#);
        assert_eq!(frame.len(), 32);

        match Message::from(frame) {
            Message::Text(t) => assert_eq!(t.as_str(), r#"{"type":"clientCount","count":1}"#),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_binary_frame_stays_binary() {
        let frame = RelayFrame::Binary(Bytes::from_static(b"{\"offer\":{}}"));
        assert_eq!(frame.as_bytes(), b"{\"offer\":{}}");
        assert!(matches!(Message::from(frame), Message::Binary(_)));
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId(7).to_string(), "#7");
    }
}
