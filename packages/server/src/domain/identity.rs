//! Public keys as carried on the wire, and the identity derived from them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{error::CryptoError, value_object::Identity};

/// Separator placed between the two curve coordinates of an identity.
pub const IDENTITY_SEPARATOR: char = '-';

/// Elliptic-curve public key in JSON Web Key form.
///
/// The JSON object is kept exactly as received (member order included)
/// because it is part of the signed payload and must be re-emitted byte for
/// byte. Typed accessors read the members the hub cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct PublicKeyJwk(Value);

impl PublicKeyJwk {
    /// Wrap a JSON value, which must at least be an object.
    pub fn from_value(value: Value) -> Result<Self, CryptoError> {
        if !value.is_object() {
            return Err(CryptoError::MalformedKey(
                "public key must be a JSON object".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn kty(&self) -> Option<&str> {
        self.member("kty")
    }

    pub fn crv(&self) -> Option<&str> {
        self.member("crv")
    }

    pub fn x(&self) -> Option<&str> {
        self.member("x")
    }

    pub fn y(&self) -> Option<&str> {
        self.member("y")
    }

    fn member(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }
}

impl TryFrom<Value> for PublicKeyJwk {
    type Error = CryptoError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<PublicKeyJwk> for Value {
    fn from(value: PublicKeyJwk) -> Self {
        value.0
    }
}

/// Derives identities from public keys.
///
/// The identity is `"{x}-{y}"`: no registry is consulted, so the same key
/// maps to the same identity in every session and after every restart.
pub struct IdentityResolver;

impl IdentityResolver {
    /// Resolve the canonical identity of `key`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::MalformedKey` when `x` or `y` is missing, not a
    /// string, or empty.
    pub fn resolve(key: &PublicKeyJwk) -> Result<Identity, CryptoError> {
        let x = Self::coordinate(key.x(), "x")?;
        let y = Self::coordinate(key.y(), "y")?;
        Identity::new(format!("{x}{IDENTITY_SEPARATOR}{y}"))
            .map_err(|e| CryptoError::MalformedKey(e.to_string()))
    }

    fn coordinate<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, CryptoError> {
        match value {
            Some(v) if !v.is_empty() => Ok(v),
            Some(_) => Err(CryptoError::MalformedKey(format!(
                "coordinate '{name}' is empty"
            ))),
            None => Err(CryptoError::MalformedKey(format!(
                "coordinate '{name}' is missing"
            ))),
        }
    }
}
