//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionIdFactory, RoomKey},
    infrastructure::dto::http::ErrorDto,
    ui::state::AppState,
    usecase::{AuthorizeEventUseCase, RoomHandle},
};

/// `GET /ws/`: join the default room
pub async fn websocket_default_room(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    upgrade(ws, state, RoomKey::default_room()).await
}

/// `GET /ws/{room}`
pub async fn websocket_room(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Response {
    match RoomKey::new(room) {
        Ok(key) => upgrade(ws, state, key).await,
        Err(e) => {
            tracing::warn!("Invalid room key: {}", e);
            (StatusCode::BAD_REQUEST, Json(ErrorDto::new(e.to_string()))).into_response()
        }
    }
}

async fn upgrade(ws: WebSocketUpgrade, state: Arc<AppState>, key: RoomKey) -> Response {
    let room = match state.hub.room(&key).await {
        Ok(room) => room,
        Err(e) => {
            tracing::error!("Failed to open room '{}': {}", key, e);
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorDto::new(e.to_string())),
            )
                .into_response();
        }
    };

    ws.max_message_size(state.max_frame_bytes)
        .on_upgrade(move |socket| handle_socket(socket, room))
}

async fn handle_socket(socket: WebSocket, room: RoomHandle) {
    let connection = ConnectionIdFactory::generate();
    let (mut sender, mut receiver) = socket.split();

    // Frames for this socket, fed by the room worker
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    if room.attach(connection, tx).await.is_err() {
        tracing::error!("Room '{}' is not running", room.key());
        return;
    }
    tracing::info!("Connection {} opened on room '{}'", connection, room.key());

    // Validation and signature checks run here, off the room worker.
    let recv_room = room.clone();
    let mut recv_task = tokio::spawn(async move {
        let authorize = AuthorizeEventUseCase::new();
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on connection {}: {}", connection, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!(
                        "Received {} bytes from connection {}",
                        text.as_str().len(),
                        connection
                    );
                    match authorize.execute(text.as_str()) {
                        Ok(event) => {
                            if recv_room.submit(connection, event).await.is_err() {
                                tracing::error!("Room '{}' stopped", recv_room.key());
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Dropped event from connection {}: {}", connection, e);
                        }
                    }
                }
                Message::Binary(_) => {
                    tracing::debug!("Ignored binary frame from connection {}", connection);
                }
                Message::Close(_) => {
                    tracing::info!("Connection {} requested close", connection);
                    break;
                }
                _ => {}
            }
        }
    });

    // Ends when the room drops this connection's outbox (replaced or detached).
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    if room.detach(connection).await.is_err() {
        tracing::debug!("Room '{}' already stopped", room.key());
    }
    tracing::info!("Connection {} closed", connection);
}
