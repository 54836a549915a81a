//! UseCase: 受信メッセージの認可
//!
//! ルームの状態に触れる前に、受信したテキストフレームを
//! 「形の検証 → 署名者 identity の解決 → 署名検証 → 種別ごとの本文解析」
//! の順に処理します。ここで失敗したイベントはルームに一切影響しません。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - AuthorizeEventUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 改ざんされたメッセージがルームに届かないことを保証する
//! - 署名者 identity が公開鍵から導出されることを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：HANDSHAKE / MESSAGE / PERSON
//! - 異常系：JSON でない、形が不正、署名の改ざん、鍵の不備

use serde_json::Value;

use crate::domain::{
    AuthorizationError, EnvelopeKind, Identity, IdentityResolver, MessageBody, PersonPayload,
    SignatureVerifier, SignedEnvelope, ValidationErrors,
};

use super::error::PipelineError;

/// 認可済みイベントの中身
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    Handshake,
    Message(MessageBody),
    Person(PersonPayload),
}

/// 署名検証を通過したイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedEvent {
    /// 埋め込まれた公開鍵から導出した署名者 identity
    pub signer: Identity,
    pub payload: EventPayload,
}

/// 受信メッセージ認可のユースケース
#[derive(Debug, Default, Clone, Copy)]
pub struct AuthorizeEventUseCase;

impl AuthorizeEventUseCase {
    /// 新しい AuthorizeEventUseCase を作成
    pub fn new() -> Self {
        Self
    }

    /// 受信テキストを認可済みイベントに変換
    ///
    /// # Arguments
    ///
    /// * `text` - WebSocket のテキストフレーム
    ///
    /// # Returns
    ///
    /// * `Ok(AuthorizedEvent)` - ルームに渡してよいイベント
    /// * `Err(PipelineError)` - 破棄すべきイベント（Validation / Crypto / Authorization）
    pub fn execute(&self, text: &str) -> Result<AuthorizedEvent, PipelineError> {
        // 1. JSON として解析し、形を検証
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ValidationErrors::single(format!("message is not valid JSON: {e}")))?;
        let envelope = SignedEnvelope::validate(&value)?;

        // 2. 署名者 identity を解決
        let signer = IdentityResolver::resolve(&envelope.public_key)?;

        // 3. signature を除いた正規化ペイロードに対して署名を検証
        if !SignatureVerifier::verify(
            &envelope.signed_bytes(),
            &envelope.signature,
            &envelope.public_key,
        ) {
            return Err(AuthorizationError::BadSignature.into());
        }

        // 4. 種別ごとに本文を解析
        let payload = match envelope.kind {
            EnvelopeKind::Handshake => EventPayload::Handshake,
            EnvelopeKind::Message => EventPayload::Message(
                MessageBody::new(envelope.body)
                    .map_err(|e| ValidationErrors::single(format!("body: {e}")))?,
            ),
            EnvelopeKind::Person => EventPayload::Person(PersonPayload::parse(&envelope.body)?),
        };

        Ok(AuthorizedEvent { signer, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::CryptoError, test_support::TestKey};
    use serde_json::json;

    #[test]
    fn test_authorize_message_success() {
        // テスト項目: 正しく署名された MESSAGE は署名者 identity 付きで認可される
        // given (前提条件):
        let key = TestKey::generate();
        let text = key.envelope("MESSAGE", "hi").to_string();

        // when (操作):
        let event = AuthorizeEventUseCase::new().execute(&text).unwrap();

        // then (期待する結果):
        assert_eq!(event.signer, key.identity());
        assert_eq!(
            event.payload,
            EventPayload::Message(MessageBody::new("hi".to_string()).unwrap())
        );
    }

    #[test]
    fn test_authorize_handshake_with_empty_body() {
        // テスト項目: 本文が空の HANDSHAKE も認可される
        let key = TestKey::generate();
        let text = key.envelope("HANDSHAKE", "").to_string();

        let event = AuthorizeEventUseCase::new().execute(&text).unwrap();

        assert_eq!(event.payload, EventPayload::Handshake);
    }

    #[test]
    fn test_authorize_person_parses_body() {
        // テスト項目: PERSON の本文は PersonPayload として解析される
        let key = TestKey::generate();
        let body = json!({"identity": key.identity().as_str(), "title": "alice"}).to_string();
        let text = key.envelope("PERSON", &body).to_string();

        let event = AuthorizeEventUseCase::new().execute(&text).unwrap();

        match event.payload {
            EventPayload::Person(person) => {
                assert_eq!(person.identity, key.identity());
                assert_eq!(person.title.unwrap().as_str(), "alice");
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_authorize_flipped_signature_bit_is_rejected() {
        // テスト項目: 署名の 1 ビットを反転すると BadSignature で拒否される
        // given (前提条件):
        let key = TestKey::generate();
        let mut envelope = key.envelope("MESSAGE", "hi");
        let first = envelope["signature"][0].as_u64().unwrap();
        envelope["signature"][0] = json!(first ^ 0x01);

        // when (操作):
        let result = AuthorizeEventUseCase::new().execute(&envelope.to_string());

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(PipelineError::Authorization(AuthorizationError::BadSignature))
        ));
    }

    #[test]
    fn test_authorize_altered_body_is_rejected() {
        // テスト項目: 署名後に本文を書き換えると拒否される
        let key = TestKey::generate();
        let mut envelope = key.envelope("MESSAGE", "hi");
        envelope["body"] = json!("bye");

        let result = AuthorizeEventUseCase::new().execute(&envelope.to_string());

        assert!(matches!(result, Err(PipelineError::Authorization(_))));
    }

    #[test]
    fn test_authorize_swapped_key_is_rejected() {
        // テスト項目: 他人の公開鍵に差し替えると拒否される
        let key = TestKey::generate();
        let other = TestKey::generate();
        let mut envelope = key.envelope("MESSAGE", "hi");
        envelope["publicKey"] = other.jwk().as_value().clone();

        let result = AuthorizeEventUseCase::new().execute(&envelope.to_string());

        assert!(matches!(result, Err(PipelineError::Authorization(_))));
    }

    #[test]
    fn test_authorize_key_without_coordinates_is_crypto_error() {
        // テスト項目: 座標の無い鍵は CryptoError になる
        let text = json!({
            "type": "MESSAGE",
            "body": "hi",
            "publicKey": {"kty": "EC", "crv": "P-256"},
            "signature": [0, 1],
        })
        .to_string();

        let result = AuthorizeEventUseCase::new().execute(&text);

        assert!(matches!(
            result,
            Err(PipelineError::Crypto(CryptoError::MalformedKey(_)))
        ));
    }

    #[test]
    fn test_authorize_invalid_json_is_validation_error() {
        // テスト項目: JSON でないフレームは ValidationError になる
        let result = AuthorizeEventUseCase::new().execute("hello");
        assert!(matches!(result, Err(PipelineError::Validation(_))));
    }

    #[test]
    fn test_authorize_empty_message_body_is_validation_error() {
        // テスト項目: 署名が正しくても本文が空の MESSAGE は ValidationError になる
        let key = TestKey::generate();
        let text = key.envelope("MESSAGE", "").to_string();

        let result = AuthorizeEventUseCase::new().execute(&text);

        assert!(matches!(result, Err(PipelineError::Validation(_))));
    }
}
