//! Presence and chat hub library.
//!
//! Clients connect over WebSocket, prove who they are by signing every event
//! with a P-256 key, and share a room's presence list and short-lived chat
//! messages. Each room is owned by a single worker task that validates,
//! persists and broadcasts changes in order.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export entry points
pub use error::ServerError;
pub use ui::{build_router, run as run_server, serve};
