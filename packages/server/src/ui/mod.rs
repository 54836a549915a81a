//! UI 層
//!
//! HTTP / WebSocket のエンドポイントとサーバーの起動・終了を担当します。

mod handler;
mod runner;
mod signal;
pub mod state;

pub use runner::{build_router, run, serve};
