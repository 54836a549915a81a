//! Shared utilities for the Huddle server and client binaries.

pub mod logger;
pub mod time;
