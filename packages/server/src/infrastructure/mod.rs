//! Infrastructure layer: wire DTOs, state store backends and live sessions.

pub mod dto;
pub mod repository;
pub mod session;
