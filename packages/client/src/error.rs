//! Client errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to access key file {path}: {source}")]
    KeyFileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("key file {path} is invalid: {reason}")]
    KeyFileInvalid { path: PathBuf, reason: String },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("prompt error: {0}")]
    Prompt(#[from] rustyline::error::ReadlineError),

    #[error("failed to encode message: {0}")]
    Serialization(#[from] serde_json::Error),
}
