//! Signing keys for unit tests.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use p256::ecdsa::{Signature, SigningKey, signature::Signer};
use serde_json::{Value, json};

use crate::domain::{Identity, IdentityResolver, PublicKeyJwk, SignedPayload};

/// A freshly generated P-256 key pair.
pub struct TestKey {
    signing: SigningKey,
}

impl TestKey {
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    /// Public half in the JWK form browsers export.
    pub fn jwk(&self) -> PublicKeyJwk {
        let point = self.signing.verifying_key().to_encoded_point(false);
        let x = point.x().map(|x| URL_SAFE_NO_PAD.encode(x)).unwrap_or_default();
        let y = point.y().map(|y| URL_SAFE_NO_PAD.encode(y)).unwrap_or_default();
        PublicKeyJwk::from_value(json!({"kty": "EC", "crv": "P-256", "x": x, "y": y})).unwrap()
    }

    pub fn identity(&self) -> Identity {
        IdentityResolver::resolve(&self.jwk()).unwrap()
    }

    /// Raw `r‖s` signature over `payload`.
    pub fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let signature: Signature = self.signing.sign(payload);
        signature.to_bytes().to_vec()
    }

    /// A complete signed client message.
    pub fn envelope(&self, kind: &str, body: &str) -> Value {
        let jwk = self.jwk();
        let signature = self.sign(&SignedPayload::new(kind, body, jwk.as_value()).to_bytes());
        json!({
            "type": kind,
            "body": body,
            "publicKey": jwk.as_value(),
            "signature": signature,
        })
    }
}
