//! Live connections of one room and event fan-out.

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, Identity, Message, Person, RoomState, SystemMessage},
    infrastructure::dto::websocket::{OutboundEvent, RoomStateDto},
};

/// Channel feeding one socket's writer task with serialized frames.
pub type Outbox = mpsc::UnboundedSender<String>;

/// An identified connection
pub struct Session {
    /// Presence record the session was opened (or last refreshed) with
    pub person: Person,
    /// Connection currently backing the session
    pub connection: ConnectionId,
    outbox: Outbox,
}

/// Result of binding a connection to an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// First live session of the identity; announce it
    Joined,
    /// The identity already had a session, now backed by this connection
    Reconnected,
    /// Same connection, same identity; only the person record was refreshed
    Refreshed,
    /// The connection is no longer attached
    Detached,
}

/// Result of removing a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// An identified session ended
    Left(Person),
    /// The connection never identified itself
    Unidentified,
    /// No live connection matched (already replaced or removed)
    Zombie,
}

/// Connections of one room.
///
/// Connections start out attached but anonymous and only receive
/// broadcasts once they join under an identity. Each identity has at most
/// one session; a newer connection replaces the older one in place.
#[derive(Default)]
pub struct SessionRegistry {
    pending: HashMap<ConnectionId, Outbox>,
    sessions: Vec<Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly upgraded connection.
    pub fn attach(&mut self, connection: ConnectionId, outbox: Outbox) {
        self.pending.insert(connection, outbox);
    }

    /// Bind `connection` to `person.identity`.
    pub fn join(&mut self, person: Person, connection: ConnectionId) -> JoinOutcome {
        let outbox = if let Some(outbox) = self.pending.remove(&connection) {
            outbox
        } else if let Some(index) = self.position_by_connection(connection) {
            if self.sessions[index].person.identity == person.identity {
                self.sessions[index].person = person;
                return JoinOutcome::Refreshed;
            }
            // The connection now speaks for another identity.
            self.sessions.remove(index).outbox
        } else {
            return JoinOutcome::Detached;
        };

        if let Some(session) = self
            .sessions
            .iter_mut()
            .find(|s| s.person.identity == person.identity)
        {
            tracing::info!(
                "Session of '{}' moved from connection {} to {}",
                session.person.title,
                session.connection,
                connection
            );
            // Dropping the previous outbox closes the superseded socket.
            session.connection = connection;
            session.outbox = outbox;
            session.person = person;
            return JoinOutcome::Reconnected;
        }

        self.sessions.push(Session {
            person,
            connection,
            outbox,
        });
        JoinOutcome::Joined
    }

    /// Remove whatever `connection` backs.
    pub fn leave(&mut self, connection: ConnectionId) -> LeaveOutcome {
        if self.pending.remove(&connection).is_some() {
            return LeaveOutcome::Unidentified;
        }
        match self.position_by_connection(connection) {
            Some(index) => LeaveOutcome::Left(self.sessions.remove(index).person),
            None => {
                tracing::warn!(
                    "Zombie disconnect: connection {} has no live session",
                    connection
                );
                LeaveOutcome::Zombie
            }
        }
    }

    pub fn broadcast_persons(&self, persons: &[Person]) -> usize {
        self.broadcast(&OutboundEvent::persons(persons))
    }

    pub fn broadcast_message(&self, message: &Message) -> usize {
        self.broadcast(&OutboundEvent::message(message))
    }

    pub fn broadcast_system_message(&self, message: &SystemMessage) -> usize {
        self.broadcast(&OutboundEvent::system_message(message))
    }

    pub fn broadcast_snapshot(&self, state: &RoomState) -> usize {
        self.broadcast(&RoomStateDto::from(state))
    }

    /// Serialize `payload` once and queue it on every session.
    ///
    /// # Returns
    ///
    /// Number of sessions the frame was queued for
    pub fn broadcast<T: Serialize>(&self, payload: &T) -> usize {
        let Some(frame) = Self::encode(payload) else {
            return 0;
        };
        let mut delivered = 0;
        for session in &self.sessions {
            if session.outbox.send(frame.clone()).is_ok() {
                delivered += 1;
            } else {
                tracing::warn!(
                    "Failed to queue frame for '{}' (connection {})",
                    session.person.title,
                    session.connection
                );
            }
        }
        delivered
    }

    /// Queue `payload` on the session backed by `connection` only.
    pub fn send_to<T: Serialize>(&self, connection: ConnectionId, payload: &T) -> bool {
        let Some(index) = self.position_by_connection(connection) else {
            return false;
        };
        let Some(frame) = Self::encode(payload) else {
            return false;
        };
        self.sessions[index].outbox.send(frame).is_ok()
    }

    pub fn get(&self, identity: &Identity) -> Option<&Session> {
        self.sessions.iter().find(|s| &s.person.identity == identity)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Attached connections, identified or not.
    pub fn connection_count(&self) -> usize {
        self.pending.len() + self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connection_count() == 0
    }

    fn position_by_connection(&self, connection: ConnectionId) -> Option<usize> {
        self.sessions.iter().position(|s| s.connection == connection)
    }

    fn encode<T: Serialize>(payload: &T) -> Option<String> {
        match serde_json::to_string(payload) {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::error!("Failed to serialize outbound frame: {}", e);
                None
            }
        }
    }
}
