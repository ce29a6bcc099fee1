//! Relay message contract

pub mod message;

pub use message::{ChatMessage, Envelope, ServerMessage, SignalKind};
