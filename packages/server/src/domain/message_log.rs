//! Time-bounded chat history of a room.

use chrono::{DateTime, Duration, Utc};

use super::entity::Message;

/// Messages in append order.
///
/// There is no count cap; entries only leave through [`MessageLog::evict_expired`].
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Drop every message whose `date + dissolve` lies before `now`.
    ///
    /// # Returns
    ///
    /// Number of removed messages
    pub fn evict_expired(&mut self, now: DateTime<Utc>, dissolve: Duration) -> usize {
        let before = self.messages.len();
        self.messages.retain(|m| !m.date.is_expired(now, dissolve));
        before - self.messages.len()
    }

    pub fn list(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
