//! Shared application state.

use std::sync::Arc;

use crate::{config::ServerConfig, domain::StateStore, usecase::RoomHub};

/// State handed to every handler
pub struct AppState {
    /// Room workers, spawned on first use
    pub hub: RoomHub,
    /// Largest WebSocket message accepted from a client
    pub max_frame_bytes: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn StateStore>, config: &ServerConfig) -> Self {
        Self {
            hub: RoomHub::new(store, config.room.clone()),
            max_frame_bytes: config.max_frame_bytes,
        }
    }
}
