//! # Flash Messages
//!
//! User-visible messages queued during one request and shown on a later
//! page render.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Severity of a queued message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Something the shopper asked for failed.
    Error,
    /// Something succeeded with caveats.
    Warning,
    /// Informational.
    Notice,
    /// Something the shopper asked for succeeded.
    Success,
}

/// A queued user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Severity.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Display text.
    pub text: String,
}

impl Message {
    /// An error message.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            text: text.into(),
        }
    }
}

/// Destination for user-visible messages.
pub trait MessageSink: Send + Sync {
    /// Queue a message.
    fn add(&self, message: Message);

    /// Queue an error message.
    fn add_error(&self, text: &str) {
        self.add(Message::error(text));
    }
}

/// In-memory message queue.
#[derive(Debug, Default)]
pub struct MessageQueue {
    messages: Mutex<Vec<Message>>,
}

impl MessageQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued message, leaving the queue empty.
    pub fn drain(&self) -> Vec<Message> {
        std::mem::take(&mut *self.messages.lock())
    }

    /// Copy of the queued messages.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.lock().clone()
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MessageSink for MessageQueue {
    fn add(&self, message: Message) {
        self.messages.lock().push(message);
    }
}
