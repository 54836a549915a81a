//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層を操作します。
//!
//! - 受信メッセージの検証・署名検証（接続ごとのタスクで実行）
//! - ルーム状態の変更・永続化・ブロードキャスト（ルームごとの単一ワーカーで直列化）

pub mod authorize_event;
pub mod check_signature;
pub mod error;
pub mod room_coordinator;
pub mod room_hub;
pub mod room_worker;

pub use authorize_event::{AuthorizeEventUseCase, AuthorizedEvent, EventPayload};
pub use check_signature::CheckSignatureUseCase;
pub use error::{CheckSignatureError, PipelineError, RoomStateError};
pub use room_coordinator::RoomCoordinator;
pub use room_hub::RoomHub;
pub use room_worker::{RoomClosed, RoomCommand, RoomHandle, RoomWorker, WeakRoomHandle};
