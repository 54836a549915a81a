//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::{
    domain::RoomKey,
    infrastructure::dto::{
        http::{ErrorDto, SigcheckResultDto, StatusDto, ValidationErrorsDto},
        websocket::RoomStateDto,
    },
    ui::state::AppState,
    usecase::{CheckSignatureError, CheckSignatureUseCase},
};

/// Health check endpoint
pub async fn status() -> Json<StatusDto> {
    Json(StatusDto::ok())
}

/// Verify a signed message without touching any room.
pub async fn sigcheck(payload: Result<Json<Value>, JsonRejection>) -> Response {
    let Json(value) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::debug!("Rejected sigcheck body: {}", rejection);
            return bad_request(rejection.body_text());
        }
    };

    match CheckSignatureUseCase::new().execute(&value) {
        Ok(result) => Json(SigcheckResultDto { result }).into_response(),
        Err(CheckSignatureError::Validation(errors)) => (
            StatusCode::BAD_REQUEST,
            Json(ValidationErrorsDto {
                errors: errors.into_messages(),
            }),
        )
            .into_response(),
        Err(e) => bad_request(e.to_string()),
    }
}

/// Current state of a room (read from the store when no worker is running)
pub async fn room_state(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Response {
    let key = match RoomKey::new(room) {
        Ok(key) => key,
        Err(e) => return bad_request(e.to_string()),
    };

    match state.hub.state(&key).await {
        Ok(snapshot) => Json(RoomStateDto::from(&snapshot)).into_response(),
        Err(e) => {
            tracing::error!("Failed to read room '{}': {}", key, e);
            unavailable(e.to_string())
        }
    }
}

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorDto::new(message))).into_response()
}

fn unavailable(message: impl Into<String>) -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorDto::new(message))).into_response()
}
