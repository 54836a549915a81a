//! HTTP API request/response DTOs.

use serde::{Deserialize, Serialize};

/// Body of `GET /status/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusDto {
    pub status: String,
}

impl StatusDto {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Successful body of `POST /sigcheck/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigcheckResultDto {
    pub result: bool,
}

/// `400` body listing every validation failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorsDto {
    pub errors: Vec<String>,
}

/// `400`/`503` body carrying a single message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDto {
    pub error: String,
}

impl ErrorDto {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
