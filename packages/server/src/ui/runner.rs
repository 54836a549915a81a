//! Router assembly and server startup.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::ServerConfig,
    domain::{RoomKey, StateStore},
    error::ServerError,
    infrastructure::repository::{FileStateStore, InMemoryStateStore},
    ui::{handler, signal::shutdown_signal, state::AppState},
};

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // HTTP API
        .route("/status", get(handler::status))
        .route("/status/", get(handler::status))
        .route("/sigcheck", post(handler::sigcheck))
        .route("/sigcheck/", post(handler::sigcheck))
        .route("/rooms/{room}/state", get(handler::room_state))
        // WebSocket
        .route("/ws", get(handler::websocket_default_room))
        .route("/ws/", get(handler::websocket_default_room))
        .route("/ws/{room}", get(handler::websocket_room))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until a shutdown signal arrives.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), ServerError> {
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

/// Run the hub with the given configuration.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let store: Arc<dyn StateStore> = match &config.store_dir {
        Some(dir) => {
            tracing::info!("Persisting room snapshots under {}", dir.display());
            Arc::new(FileStateStore::new(dir.clone()))
        }
        None => {
            tracing::info!("Keeping room snapshots in memory");
            Arc::new(InMemoryStateStore::new())
        }
    };
    let state = Arc::new(AppState::new(store, &config));

    // Fail fast when the store cannot be read.
    state.hub.room(&RoomKey::default_room()).await?;

    let listener = TcpListener::bind(config.bind_addr()).await?;
    serve(listener, state).await
}
