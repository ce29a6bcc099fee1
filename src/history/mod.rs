//! Chat history retention

pub mod buffer;

pub use buffer::{HistoryBuffer, DEFAULT_HISTORY_CAPACITY};
