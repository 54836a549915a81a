//! The client's signing key and signed outbound messages.

use std::{
    fs,
    path::{Path, PathBuf},
};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use huddle_server::{
    domain::{EnvelopeKind, SignedPayload},
    infrastructure::dto::websocket::InboundMessageDto,
};
use p256::ecdsa::{Signature, SigningKey, signature::Signer};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ClientError;

/// Private key as stored on disk (a P-256 private JWK)
#[derive(Debug, Serialize, Deserialize)]
struct KeyFile {
    kty: String,
    crv: String,
    x: String,
    y: String,
    d: String,
}

/// P-256 signing key of this client
pub struct ClientKey {
    signing: SigningKey,
}

impl ClientKey {
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    /// Load the key stored at `path`, or create and store a new one.
    pub fn load_or_create(path: &Path) -> Result<Self, ClientError> {
        if path.exists() {
            let key = Self::load(path)?;
            tracing::info!("Loaded key from {}", path.display());
            return Ok(key);
        }

        let key = Self::generate();
        key.save(path)?;
        tracing::info!("Generated a new key at {}", path.display());
        Ok(key)
    }

    fn load(path: &Path) -> Result<Self, ClientError> {
        let text = fs::read_to_string(path).map_err(|source| ClientError::KeyFileIo {
            path: path.to_path_buf(),
            source,
        })?;
        let file: KeyFile =
            serde_json::from_str(&text).map_err(|e| invalid(path, e.to_string()))?;
        if file.kty != "EC" || file.crv != "P-256" {
            return Err(invalid(path, format!("unsupported key {}/{}", file.kty, file.crv)));
        }
        let secret = URL_SAFE_NO_PAD
            .decode(file.d.trim_end_matches('='))
            .map_err(|e| invalid(path, e.to_string()))?;
        let signing = SigningKey::from_slice(&secret).map_err(|e| invalid(path, e.to_string()))?;
        Ok(Self { signing })
    }

    fn save(&self, path: &Path) -> Result<(), ClientError> {
        let io_error = |source: std::io::Error| ClientError::KeyFileIo {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let (x, y) = self.coordinates();
        let file = KeyFile {
            kty: "EC".to_string(),
            crv: "P-256".to_string(),
            x,
            y,
            d: URL_SAFE_NO_PAD.encode(self.signing.to_bytes()),
        };
        fs::write(path, serde_json::to_string_pretty(&file)?).map_err(io_error)
    }

    /// Public half as the JWK embedded in every message
    pub fn jwk(&self) -> Value {
        let (x, y) = self.coordinates();
        json!({"kty": "EC", "crv": "P-256", "x": x, "y": y})
    }

    /// Identity the hub derives from this key
    pub fn identity(&self) -> String {
        let (x, y) = self.coordinates();
        format!("{x}-{y}")
    }

    /// Build a signed client message.
    pub fn sign(&self, kind: EnvelopeKind, body: &str) -> InboundMessageDto {
        let public_key = self.jwk();
        let payload = SignedPayload::new(kind.as_str(), body, &public_key).to_bytes();
        let signature: Signature = self.signing.sign(&payload);
        InboundMessageDto {
            r#type: kind.as_str().to_string(),
            body: body.to_string(),
            public_key,
            signature: signature.to_bytes().to_vec(),
        }
    }

    pub fn handshake(&self) -> InboundMessageDto {
        self.sign(EnvelopeKind::Handshake, "")
    }

    pub fn message(&self, text: &str) -> InboundMessageDto {
        self.sign(EnvelopeKind::Message, text)
    }

    /// PERSON update of this client's own record
    pub fn person(&self, title: &str) -> InboundMessageDto {
        let body = json!({"identity": self.identity(), "title": title}).to_string();
        self.sign(EnvelopeKind::Person, &body)
    }

    fn coordinates(&self) -> (String, String) {
        let point = self.signing.verifying_key().to_encoded_point(false);
        let encode = |c: Option<&p256::FieldBytes>| {
            c.map(|c| URL_SAFE_NO_PAD.encode(c)).unwrap_or_default()
        };
        (encode(point.x()), encode(point.y()))
    }
}

fn invalid(path: &Path, reason: String) -> ClientError {
    ClientError::KeyFileInvalid {
        path: PathBuf::from(path),
        reason,
    }
}
