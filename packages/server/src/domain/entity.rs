//! Core domain models for the presence hub.

use serde::{Deserialize, Serialize};

use super::value_object::{Identity, MessageBody, Timestamp, Title};

/// Presence record of one identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Identity derived from the person's public key
    pub identity: Identity,
    /// Display label, writable only by the owner of `identity`
    pub title: Title,
}

impl Person {
    pub fn new(identity: Identity, title: Title) -> Self {
        Self { identity, title }
    }

    /// Person seen for the first time, titled after its identity prefix.
    pub fn with_default_title(identity: Identity) -> Self {
        let title = identity.default_title();
        Self { identity, title }
    }
}

/// Chat message authored by an identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author identity (the verified signer)
    pub identity: Identity,
    /// Message text
    pub body: MessageBody,
    /// Instant the room accepted the message
    pub date: Timestamp,
}

impl Message {
    pub fn new(identity: Identity, body: MessageBody, date: Timestamp) -> Self {
        Self {
            identity,
            body,
            date,
        }
    }
}

/// Synthetic join/quit notice; never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMessage {
    pub body: String,
    pub date: Timestamp,
}

impl SystemMessage {
    pub fn joined(title: &Title, date: Timestamp) -> Self {
        Self {
            body: format!("{title} joined"),
            date,
        }
    }

    pub fn quit(title: &Title, date: Timestamp) -> Self {
        Self {
            body: format!("{title} quit"),
            date,
        }
    }
}

/// Everything a room persists: presence records and retained messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomState {
    pub persons: Vec<Person>,
    pub messages: Vec<Message>,
}
