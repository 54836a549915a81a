//! Command line client for the Huddle presence and chat hub.
//!
//! Keeps a P-256 key on disk so the user's identity survives restarts,
//! signs every event it sends and renders what the hub broadcasts.

pub mod error;
pub mod input;
pub mod render;
pub mod session;
pub mod signer;

// Re-export entry points
pub use session::{ClientOptions, run_client};
