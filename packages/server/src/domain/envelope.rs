//! Shapes of inbound payloads and their validation.
//!
//! A wire message is first checked as a [`SignedEnvelope`]; the body of a
//! `PERSON` message is then checked as a [`PersonPayload`]. Each check
//! collects every violation into a [`ValidationErrors`] list instead of
//! stopping at the first one.

use std::fmt;

use serde_json::{Map, Value};

use super::{
    error::ValidationErrors,
    identity::PublicKeyJwk,
    signature::SignedPayload,
    value_object::{Identity, Title},
};

/// Kind of a client → server message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    Handshake,
    Message,
    Person,
}

impl EnvelopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Handshake => "HANDSHAKE",
            Self::Message => "MESSAGE",
            Self::Person => "PERSON",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "HANDSHAKE" => Some(Self::Handshake),
            "MESSAGE" => Some(Self::Message),
            "PERSON" => Some(Self::Person),
            _ => None,
        }
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structurally valid, not yet verified, client message.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedEnvelope {
    pub kind: EnvelopeKind,
    pub body: String,
    pub public_key: PublicKeyJwk,
    pub signature: Vec<u8>,
}

impl SignedEnvelope {
    /// Validate a parsed JSON value against the envelope shape.
    pub fn validate(value: &Value) -> Result<Self, ValidationErrors> {
        let Some(object) = value.as_object() else {
            return Err(ValidationErrors::single("message must be a JSON object"));
        };
        let mut errors = ValidationErrors::new();

        let kind = match object.get("type") {
            None | Some(Value::Null) => {
                errors.push("type is a required field");
                None
            }
            Some(Value::String(s)) => {
                let kind = EnvelopeKind::parse(s);
                if kind.is_none() {
                    errors.push(format!(
                        "type must be one of HANDSHAKE, MESSAGE, PERSON (got '{s}')"
                    ));
                }
                kind
            }
            Some(_) => {
                errors.push("type must be a string");
                None
            }
        };

        let body = required_string(object, "body", &mut errors);

        let public_key = match object.get("publicKey") {
            None | Some(Value::Null) => {
                errors.push("publicKey is a required field");
                None
            }
            Some(v) => match PublicKeyJwk::from_value(v.clone()) {
                Ok(key) => Some(key),
                Err(_) => {
                    errors.push("publicKey must be an object");
                    None
                }
            },
        };

        let signature = match object.get("signature") {
            None | Some(Value::Null) => {
                errors.push("signature is a required field");
                None
            }
            Some(Value::Array(items)) => signature_bytes(items, &mut errors),
            Some(_) => {
                errors.push("signature must be an array of bytes");
                None
            }
        };

        match (kind, body, public_key, signature) {
            (Some(kind), Some(body), Some(public_key), Some(signature)) if errors.is_empty() => {
                Ok(Self {
                    kind,
                    body,
                    public_key,
                    signature,
                })
            }
            _ => Err(errors),
        }
    }

    /// Canonical bytes this envelope's signature must cover.
    pub fn signed_bytes(&self) -> Vec<u8> {
        SignedPayload::new(self.kind.as_str(), &self.body, self.public_key.as_value()).to_bytes()
    }
}

/// Person record as submitted in the body of a `PERSON` message.
///
/// The title is optional; a missing title keeps the stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonPayload {
    pub identity: Identity,
    pub title: Option<Title>,
}

impl PersonPayload {
    /// Parse and validate the JSON text carried in a `PERSON` body.
    pub fn parse(body: &str) -> Result<Self, ValidationErrors> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| ValidationErrors::single(format!("body is not valid JSON: {e}")))?;
        Self::validate(&value)
    }

    pub fn validate(value: &Value) -> Result<Self, ValidationErrors> {
        let Some(object) = value.as_object() else {
            return Err(ValidationErrors::single("person must be a JSON object"));
        };
        let mut errors = ValidationErrors::new();

        let identity = required_string(object, "identity", &mut errors).and_then(|raw| {
            Identity::new(raw)
                .map_err(|e| errors.push(format!("identity: {e}")))
                .ok()
        });

        let title = match object.get("title") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => match Title::new(s.clone()) {
                Ok(title) => Some(title),
                Err(e) => {
                    errors.push(format!("title: {e}"));
                    None
                }
            },
            Some(_) => {
                errors.push("title must be a string");
                None
            }
        };

        match identity {
            Some(identity) if errors.is_empty() => Ok(Self { identity, title }),
            _ => Err(errors),
        }
    }
}

fn required_string(
    object: &Map<String, Value>,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match object.get(field) {
        None | Some(Value::Null) => {
            errors.push(format!("{field} is a required field"));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(format!("{field} must be a string"));
            None
        }
    }
}

fn signature_bytes(items: &[Value], errors: &mut ValidationErrors) -> Option<Vec<u8>> {
    let bytes: Option<Vec<u8>> = items
        .iter()
        .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect();
    if bytes.is_none() {
        errors.push("signature must only contain integers between 0 and 255");
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_message() -> Value {
        json!({
            "type": "MESSAGE",
            "body": "hi",
            "publicKey": {"kty": "EC", "crv": "P-256", "x": "AA", "y": "BB"},
            "signature": [1, 2, 255],
        })
    }

    #[test]
    fn test_validate_envelope_success() {
        // テスト項目: 正しい形のメッセージは SignedEnvelope になる
        // when (操作):
        let envelope = SignedEnvelope::validate(&valid_message()).unwrap();

        // then (期待する結果):
        assert_eq!(envelope.kind, EnvelopeKind::Message);
        assert_eq!(envelope.body, "hi");
        assert_eq!(envelope.signature, vec![1, 2, 255]);
        assert_eq!(envelope.public_key.x(), Some("AA"));
    }

    #[test]
    fn test_validate_envelope_collects_every_error() {
        // テスト項目: 複数の不備はまとめて報告される
        // given (前提条件):
        let value = json!({"type": "SHOUT", "body": 3});

        // when (操作):
        let errors = SignedEnvelope::validate(&value).unwrap_err();

        // then (期待する結果):
        assert_eq!(errors.messages().len(), 4);
        assert!(errors.messages()[0].contains("SHOUT"));
        assert!(errors.messages().contains(&"body must be a string".to_string()));
        assert!(
            errors
                .messages()
                .contains(&"publicKey is a required field".to_string())
        );
        assert!(
            errors
                .messages()
                .contains(&"signature is a required field".to_string())
        );
    }

    #[test]
    fn test_validate_envelope_rejects_non_byte_signature() {
        // テスト項目: 0〜255 の整数以外を含む署名は拒否される
        let mut value = valid_message();
        value["signature"] = json!([1, 256]);

        let errors = SignedEnvelope::validate(&value).unwrap_err();

        assert_eq!(
            errors.messages(),
            &["signature must only contain integers between 0 and 255".to_string()]
        );
    }

    #[test]
    fn test_validate_envelope_rejects_non_object() {
        // テスト項目: オブジェクト以外のメッセージは拒否される
        let errors = SignedEnvelope::validate(&json!([1, 2])).unwrap_err();
        assert_eq!(errors.messages(), &["message must be a JSON object".to_string()]);
    }

    #[test]
    fn test_signed_bytes_excludes_signature() {
        // テスト項目: 署名対象のバイト列に signature フィールドは含まれない
        let envelope = SignedEnvelope::validate(&valid_message()).unwrap();
        let text = String::from_utf8(envelope.signed_bytes()).unwrap();
        assert!(text.starts_with(r#"{"type":"MESSAGE","body":"hi","publicKey":"#));
        assert!(!text.contains("signature"));
    }

    #[test]
    fn test_person_payload_parse_success() {
        // テスト項目: PERSON の本文から identity と title を取り出せる
        let payload = PersonPayload::parse(r#"{"identity":"X1-Y1","title":"alice"}"#).unwrap();
        assert_eq!(payload.identity.as_str(), "X1-Y1");
        assert_eq!(payload.title.unwrap().as_str(), "alice");
    }

    #[test]
    fn test_person_payload_title_is_optional() {
        // テスト項目: title は省略可能
        let payload = PersonPayload::parse(r#"{"identity":"X1-Y1"}"#).unwrap();
        assert!(payload.title.is_none());
    }

    #[test]
    fn test_person_payload_requires_identity() {
        // テスト項目: identity の無い PERSON 本文は拒否される
        let errors = PersonPayload::parse(r#"{"title":"alice"}"#).unwrap_err();
        assert_eq!(errors.messages(), &["identity is a required field".to_string()]);
    }

    #[test]
    fn test_person_payload_rejects_invalid_json() {
        // テスト項目: JSON でない本文は拒否される
        assert!(PersonPayload::parse("alice").is_err());
    }
}
