//! UseCase: 署名チェック API
//!
//! `POST /sigcheck/` の本体。ルームには触れず、
//! 署名付きメッセージの形と署名の正しさだけを判定します。

use serde_json::Value;

use crate::domain::{SignatureVerifier, SignedEnvelope};

use super::error::CheckSignatureError;

/// 署名チェックのユースケース
#[derive(Debug, Default, Clone, Copy)]
pub struct CheckSignatureUseCase;

impl CheckSignatureUseCase {
    pub fn new() -> Self {
        Self
    }

    /// 署名チェックを実行
    ///
    /// # Returns
    ///
    /// * `Ok(bool)` - 形が正しい入力に対する検証結果
    /// * `Err(CheckSignatureError)` - 形の不備、または鍵・署名が解釈できない
    pub fn execute(&self, value: &Value) -> Result<bool, CheckSignatureError> {
        let envelope = SignedEnvelope::validate(value)?;
        let valid = SignatureVerifier::try_verify(
            &envelope.signed_bytes(),
            &envelope.signature,
            &envelope.public_key,
        )?;
        Ok(valid)
    }
}
