//! Handler modules for HTTP and WebSocket endpoints.

pub mod http;
pub mod websocket;

// Re-export HTTP handlers
pub use http::{room_state, sigcheck, status};

// Re-export WebSocket handlers
pub use websocket::{websocket_default_room, websocket_room};
