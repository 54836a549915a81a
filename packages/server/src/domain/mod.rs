//! Domain layer for the presence hub.
//!
//! This module contains the room's business rules (identities, signatures,
//! presence, message retention) independent of transport and storage.

pub mod entity;
pub mod envelope;
pub mod error;
pub mod factory;
pub mod identity;
pub mod message_log;
pub mod person_registry;
pub mod repository;
pub mod signature;
pub mod value_object;

pub use entity::{Message, Person, RoomState, SystemMessage};
pub use envelope::{EnvelopeKind, PersonPayload, SignedEnvelope};
pub use error::{AuthorizationError, CryptoError, StoreError, ValidationErrors, ValueObjectError};
pub use factory::ConnectionIdFactory;
pub use identity::{IdentityResolver, PublicKeyJwk};
pub use message_log::MessageLog;
pub use person_registry::PersonRegistry;
pub use repository::StateStore;
pub use signature::{SignatureVerifier, SignedPayload};
pub use value_object::{ConnectionId, Identity, MessageBody, RoomKey, Timestamp, Title};
