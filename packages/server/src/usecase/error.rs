//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{AuthorizationError, CryptoError, StoreError, ValidationErrors};

use super::room_worker::RoomClosed;

/// 受信イベント処理パイプラインのエラー
///
/// Validation / Crypto / Authorization はイベントを破棄してログに残すだけで、
/// 送信者には通知しない。Store はそのステップを中断する。
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid message: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 署名チェック API のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckSignatureError {
    #[error("invalid message: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// ルーム状態の参照エラー
#[derive(Debug, Error)]
pub enum RoomStateError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Closed(#[from] RoomClosed),
}
