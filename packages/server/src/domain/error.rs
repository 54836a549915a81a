//! Domain layer error definitions.

use std::fmt;

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// Identity validation error
    #[error("Identity cannot be empty")]
    IdentityEmpty,

    /// Identity too long error
    #[error("Identity cannot exceed {max} characters (got {actual})")]
    IdentityTooLong { max: usize, actual: usize },

    /// Title too long error
    #[error("Title cannot exceed {max} characters (got {actual})")]
    TitleTooLong { max: usize, actual: usize },

    /// MessageBody validation error
    #[error("MessageBody cannot be empty")]
    MessageBodyEmpty,

    /// MessageBody too long error
    #[error("MessageBody cannot exceed {max} characters (got {actual})")]
    MessageBodyTooLong { max: usize, actual: usize },

    /// RoomKey validation error
    #[error("RoomKey cannot be empty")]
    RoomKeyEmpty,

    /// RoomKey too long error
    #[error("RoomKey cannot exceed {max} characters (got {actual})")]
    RoomKeyTooLong { max: usize, actual: usize },

    /// RoomKey invalid character error
    #[error("RoomKey may only contain ASCII letters, digits, '-' and '_' (got: {0})")]
    RoomKeyInvalidFormat(String),
}

/// Structured list of shape violations found in an inbound payload.
///
/// Validation never stops at the first problem: every violated rule adds one
/// human readable line, so the HTTP check endpoint can report them all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-entry list, for failures that happen before any field is inspected.
    pub fn single(message: impl Into<String>) -> Self {
        Self(vec![message.into()])
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn into_messages(self) -> Vec<String> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors raised while interpreting key or signature material.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The JWK lacks a usable coordinate or is not an object
    #[error("Malformed public key: {0}")]
    MalformedKey(String),

    /// The JWK names a key type or curve other than EC / P-256
    #[error("Unsupported key: kty={kty}, crv={crv}")]
    UnsupportedKey { kty: String, crv: String },

    /// The signature is not a raw 64-byte r||s pair
    #[error("Malformed signature ({len} bytes)")]
    MalformedSignature { len: usize },
}

/// Errors raised when a well-formed, correctly signed request is still not allowed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    /// Signature did not verify against the embedded public key
    #[error("Signature does not match the embedded public key")]
    BadSignature,

    /// A person record was written by someone other than its owner
    #[error("Identity '{signer}' may not write the person record of '{claimed}'")]
    IdentityMismatch { signer: String, claimed: String },
}

/// Errors related to persisted room snapshots
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying blob storage failed
    #[error("State store I/O failed for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored blob could not be encoded or decoded
    #[error("State snapshot for '{key}' is not valid JSON: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Backend-specific failure without an I/O cause
    #[error("State store unavailable: {0}")]
    Unavailable(String),
}
