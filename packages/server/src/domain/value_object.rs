//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum length of an identity string (two base64url P-256 coordinates are 87 chars).
pub const IDENTITY_MAX_CHARS: usize = 256;

/// Maximum length of a display title.
pub const TITLE_MAX_CHARS: usize = 100;

/// Maximum length of a chat message body.
pub const MESSAGE_BODY_MAX_CHARS: usize = 10000;

/// Maximum length of a room key.
pub const ROOM_KEY_MAX_CHARS: usize = 64;

/// Number of identity characters used as the default title of a new person.
pub const DEFAULT_TITLE_CHARS: usize = 4;

/// Canonical identity derived from a public key.
///
/// Two sessions holding the same key always carry equal identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Create a new Identity.
    ///
    /// # Arguments
    ///
    /// * `value` - The identity string
    ///
    /// # Returns
    ///
    /// A Result containing the Identity or an error if validation fails
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::IdentityEmpty);
        }
        let len = value.chars().count();
        if len > IDENTITY_MAX_CHARS {
            return Err(ValueObjectError::IdentityTooLong {
                max: IDENTITY_MAX_CHARS,
                actual: len,
            });
        }
        Ok(Self(value))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Title given to a person seen for the first time: the identity's leading characters.
    pub fn default_title(&self) -> Title {
        Title(self.0.chars().take(DEFAULT_TITLE_CHARS).collect())
    }
}

impl TryFrom<String> for Identity {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display label of a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Title(String);

impl Title {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let len = value.chars().count();
        if len > TITLE_MAX_CHARS {
            return Err(ValueObjectError::TitleTooLong {
                max: TITLE_MAX_CHARS,
                actual: len,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Title {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Title> for String {
    fn from(value: Title) -> Self {
        value.0
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message body value object.
///
/// Represents the text of a chat message with validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageBody(String);

impl MessageBody {
    /// Create a new MessageBody.
    ///
    /// # Arguments
    ///
    /// * `body` - The message text
    ///
    /// # Returns
    ///
    /// A Result containing the MessageBody or an error if validation fails
    pub fn new(body: String) -> Result<Self, ValueObjectError> {
        if body.is_empty() {
            return Err(ValueObjectError::MessageBodyEmpty);
        }
        let len = body.chars().count();
        if len > MESSAGE_BODY_MAX_CHARS {
            return Err(ValueObjectError::MessageBodyTooLong {
                max: MESSAGE_BODY_MAX_CHARS,
                actual: len,
            });
        }
        Ok(Self(body))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MessageBody {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MessageBody> for String {
    fn from(value: MessageBody) -> Self {
        value.0
    }
}

impl fmt::Display for MessageBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Timestamp value object.
///
/// A UTC instant, serialized as an RFC 3339 string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn new(value: DateTime<Utc>) -> Self {
        Self(value)
    }

    /// Get the inner instant.
    pub fn value(&self) -> DateTime<Utc> {
        self.0
    }

    /// True when `self + ttl` lies strictly before `now`.
    ///
    /// An expiry past the representable range never expires.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.0
            .checked_add_signed(ttl)
            .is_some_and(|expiry| expiry < now)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// Room key value object.
///
/// Addresses one isolated room; also the name of its persisted blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomKey(String);

impl RoomKey {
    /// Key of the room served at `/ws/`.
    pub const DEFAULT: &'static str = "default";

    /// Create a new RoomKey.
    ///
    /// The key doubles as a file name in the file-backed store, so only
    /// ASCII letters, digits, `-` and `_` are accepted.
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::RoomKeyEmpty);
        }
        let len = value.len();
        if len > ROOM_KEY_MAX_CHARS {
            return Err(ValueObjectError::RoomKeyTooLong {
                max: ROOM_KEY_MAX_CHARS,
                actual: len,
            });
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValueObjectError::RoomKeyInvalidFormat(value));
        }
        Ok(Self(value))
    }

    pub fn default_room() -> Self {
        Self(Self::DEFAULT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomKey {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoomKey> for String {
    fn from(value: RoomKey) -> Self {
        value.0
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle of one live WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
