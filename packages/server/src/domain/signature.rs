//! ECDSA P-256 / SHA-256 verification of signed wire messages.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use p256::{
    EncodedPoint, FieldBytes,
    ecdsa::{Signature, VerifyingKey, signature::Verifier},
};
use serde::Serialize;
use serde_json::Value;

use super::{error::CryptoError, identity::PublicKeyJwk};

/// Byte length of one P-256 affine coordinate.
const COORDINATE_LEN: usize = 32;

/// The part of a wire message that is covered by its signature.
///
/// Field order is fixed (`type`, `body`, `publicKey`) and the signature
/// itself is never part of what it signs.
#[derive(Debug, Serialize)]
pub struct SignedPayload<'a> {
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub body: &'a str,
    #[serde(rename = "publicKey")]
    pub public_key: &'a Value,
}

impl<'a> SignedPayload<'a> {
    pub fn new(kind: &'a str, body: &'a str, public_key: &'a Value) -> Self {
        Self {
            kind,
            body,
            public_key,
        }
    }

    /// Canonical bytes handed to the signer and the verifier.
    pub fn to_bytes(&self) -> Vec<u8> {
        // Two strings and an already-parsed JSON value always serialize.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// Verifies signatures produced by WebCrypto-style ECDSA keys.
pub struct SignatureVerifier;

impl SignatureVerifier {
    /// Fail-closed verification: any malformed input counts as a mismatch.
    pub fn verify(payload: &[u8], signature: &[u8], key: &PublicKeyJwk) -> bool {
        match Self::try_verify(payload, signature, key) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::debug!("Signature check failed closed: {}", e);
                false
            }
        }
    }

    /// Verification that reports unusable key or signature material.
    ///
    /// `Ok(false)` means the inputs were well formed but do not match.
    pub fn try_verify(
        payload: &[u8],
        signature: &[u8],
        key: &PublicKeyJwk,
    ) -> Result<bool, CryptoError> {
        let verifying_key = Self::verifying_key(key)?;
        // WebCrypto emits the raw 64-byte r||s form.
        let signature = Signature::from_slice(signature).map_err(|_| {
            CryptoError::MalformedSignature {
                len: signature.len(),
            }
        })?;
        Ok(verifying_key.verify(payload, &signature).is_ok())
    }

    fn verifying_key(key: &PublicKeyJwk) -> Result<VerifyingKey, CryptoError> {
        let kty = key.kty().unwrap_or_default();
        let crv = key.crv().unwrap_or_default();
        if kty != "EC" || crv != "P-256" {
            return Err(CryptoError::UnsupportedKey {
                kty: kty.to_string(),
                crv: crv.to_string(),
            });
        }

        let x = Self::coordinate(key.x(), "x")?;
        let y = Self::coordinate(key.y(), "y")?;
        let point = EncodedPoint::from_affine_coordinates(
            FieldBytes::from_slice(&x),
            FieldBytes::from_slice(&y),
            false,
        );
        VerifyingKey::from_encoded_point(&point)
            .map_err(|_| CryptoError::MalformedKey("point is not on the P-256 curve".to_string()))
    }

    fn coordinate(value: Option<&str>, name: &str) -> Result<Vec<u8>, CryptoError> {
        let encoded = value
            .ok_or_else(|| CryptoError::MalformedKey(format!("coordinate '{name}' is missing")))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.trim_end_matches('='))
            .map_err(|e| CryptoError::MalformedKey(format!("coordinate '{name}': {e}")))?;
        if bytes.len() != COORDINATE_LEN {
            return Err(CryptoError::MalformedKey(format!(
                "coordinate '{name}' is {} bytes, expected {COORDINATE_LEN}",
                bytes.len()
            )));
        }
        Ok(bytes)
    }
}
