//! Server configuration: command line / environment parsing and the typed
//! settings derived from it.

use std::{path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};
use thiserror::Error;

/// How a room tells its sessions about changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BroadcastMode {
    /// Incremental `PERSONS` / `MESSAGE` / `SYSTEM_MESSAGE` events
    #[default]
    Events,
    /// The full room state on every change and on every tick
    Snapshot,
}

/// Per-room behaviour shared by every room of a server.
#[derive(Debug, Clone)]
pub struct RoomSettings {
    /// Age after which a chat message is evicted
    pub dissolve: chrono::Duration,
    pub mode: BroadcastMode,
    /// Period of the eviction / rebroadcast tick while the room has connections
    pub tick_period: Duration,
    /// Capacity of the room's command queue
    pub queue_capacity: usize,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            dissolve: chrono::Duration::seconds(300),
            mode: BroadcastMode::Events,
            tick_period: Duration::from_secs(5),
            queue_capacity: 64,
        }
    }
}

/// Fully validated server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub room: RoomSettings,
    /// Directory of the file-backed store; `None` keeps snapshots in memory
    pub store_dir: Option<PathBuf>,
    /// Largest WebSocket message accepted from a client
    pub max_frame_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            room: RoomSettings::default(),
            store_dir: None,
            max_frame_bytes: 64 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Longest accepted message lifetime (ten years).
pub const MAX_DISSOLVE_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;
/// Longest accepted tick period (one day).
pub const MAX_TICK_SECONDS: u64 = 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("--{flag} must be at least {min} (got {actual})")]
    TooSmall {
        flag: &'static str,
        min: u64,
        actual: u64,
    },

    #[error("--{flag} must be at most {max} (got {actual})")]
    TooLarge {
        flag: &'static str,
        max: u64,
        actual: u64,
    },
}

/// Command line of `huddle-server`.
#[derive(Debug, Parser)]
#[command(name = "huddle-server", version, about = "Presence and chat hub")]
pub struct ServerCli {
    /// Address to listen on
    #[arg(long, env = "HUDDLE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "HUDDLE_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Seconds a chat message is kept before it dissolves
    #[arg(long, env = "HUDDLE_DISSOLVE_SECONDS", default_value_t = 300)]
    pub dissolve_seconds: u64,

    /// Seconds between eviction ticks of an active room
    #[arg(long, env = "HUDDLE_TICK_SECONDS", default_value_t = 5)]
    pub tick_seconds: u64,

    /// Broadcast incremental events or full snapshots
    #[arg(long, env = "HUDDLE_MODE", value_enum, default_value_t = BroadcastMode::Events)]
    pub mode: BroadcastMode,

    /// Persist room snapshots as JSON files in this directory (in-memory when unset)
    #[arg(long, env = "HUDDLE_STORE_DIR")]
    pub store_dir: Option<PathBuf>,

    /// Capacity of each room's command queue
    #[arg(long, env = "HUDDLE_ROOM_QUEUE", default_value_t = 64)]
    pub room_queue: usize,

    /// Largest WebSocket message accepted from a client, in bytes
    #[arg(long, env = "HUDDLE_MAX_FRAME_BYTES", default_value_t = 64 * 1024)]
    pub max_frame_bytes: usize,
}

impl ServerCli {
    pub fn into_config(self) -> Result<ServerConfig, ConfigError> {
        within("dissolve-seconds", 1, MAX_DISSOLVE_SECONDS, self.dissolve_seconds)?;
        within("tick-seconds", 1, MAX_TICK_SECONDS, self.tick_seconds)?;
        at_least("room-queue", 1, self.room_queue as u64)?;
        at_least("max-frame-bytes", 1024, self.max_frame_bytes as u64)?;

        Ok(ServerConfig {
            host: self.host,
            port: self.port,
            room: RoomSettings {
                dissolve: chrono::Duration::seconds(self.dissolve_seconds as i64),
                mode: self.mode,
                tick_period: Duration::from_secs(self.tick_seconds),
                queue_capacity: self.room_queue,
            },
            store_dir: self.store_dir,
            max_frame_bytes: self.max_frame_bytes,
        })
    }
}

fn at_least(flag: &'static str, min: u64, actual: u64) -> Result<(), ConfigError> {
    if actual < min {
        return Err(ConfigError::TooSmall { flag, min, actual });
    }
    Ok(())
}

fn within(flag: &'static str, min: u64, max: u64, actual: u64) -> Result<(), ConfigError> {
    at_least(flag, min, actual)?;
    if actual > max {
        return Err(ConfigError::TooLarge { flag, max, actual });
    }
    Ok(())
}
