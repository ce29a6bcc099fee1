//! Chat history buffer for late-joiner replay
//!
//! When a new client connects, it receives the retained chat backlog so it
//! sees the conversation so far. The buffer keeps the most recent messages
//! in arrival order and evicts from the head once full.

use std::collections::VecDeque;

use crate::protocol::ChatMessage;

/// Number of chat messages retained by default
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Bounded FIFO of chat messages
#[derive(Debug)]
pub struct HistoryBuffer {
    /// Maximum number of messages retained
    capacity: usize,
    /// Messages, oldest first
    messages: VecDeque<ChatMessage>,
}

impl HistoryBuffer {
    /// Create a buffer holding the default 100 messages
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a buffer with the given capacity (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            // Allocated once; push/evict never reallocates after this
            messages: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a message, evicting the oldest if the buffer is full
    ///
    /// Returns the evicted message, if any.
    pub fn append(&mut self, message: ChatMessage) -> Option<ChatMessage> {
        let evicted = if self.messages.len() == self.capacity {
            self.messages.pop_front()
        } else {
            None
        };

        self.messages.push_back(message);
        evicted
    }

    /// Copy of the current contents in arrival order
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    /// Number of retained messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Maximum number of retained messages
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}
