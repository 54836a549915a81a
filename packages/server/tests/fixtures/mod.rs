//! Test fixtures shared by the integration tests.
//!
//! `TestServer` serves the real router on an ephemeral port with an
//! in-memory store; `TestKey` signs client messages with a fresh P-256 key.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use futures_util::{SinkExt, StreamExt};
use huddle_server::{
    config::{RoomSettings, ServerConfig},
    domain::SignedPayload,
    infrastructure::{
        dto::websocket::{OutboundEvent, ServerFrame},
        repository::InMemoryStateStore,
    },
    serve,
    ui::state::AppState,
};
use p256::ecdsa::{Signature, SigningKey, signature::Signer};
use serde_json::{Value, json};
use tokio::{net::TcpStream, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long a test waits for a frame before failing.
pub const FRAME_TIMEOUT: Duration = Duration::from_secs(3);

/// A hub listening on `127.0.0.1` with an OS-assigned port
pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(RoomSettings::default()).await
    }

    pub async fn start_with(settings: RoomSettings) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let config = ServerConfig {
            room: settings,
            ..ServerConfig::default()
        };
        let state = Arc::new(AppState::new(Arc::new(InMemoryStateStore::new()), &config));
        let handle = tokio::spawn(async move {
            if let Err(e) = serve(listener, state).await {
                eprintln!("test server stopped: {e}");
            }
        });
        Self { addr, handle }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    /// Open a WebSocket to `path` (e.g. `/ws/`).
    pub async fn connect(&self, path: &str) -> Socket {
        let (socket, _) = connect_async(self.ws_url(path))
            .await
            .expect("Failed to connect WebSocket");
        socket
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A client key pair, as a browser would hold it
pub struct TestKey {
    signing: SigningKey,
}

impl TestKey {
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    pub fn jwk(&self) -> Value {
        let point = self.signing.verifying_key().to_encoded_point(false);
        json!({
            "kty": "EC",
            "crv": "P-256",
            "x": URL_SAFE_NO_PAD.encode(point.x().expect("uncompressed point")),
            "y": URL_SAFE_NO_PAD.encode(point.y().expect("uncompressed point")),
        })
    }

    /// Identity the hub derives from this key
    pub fn identity(&self) -> String {
        let jwk = self.jwk();
        format!(
            "{}-{}",
            jwk["x"].as_str().unwrap(),
            jwk["y"].as_str().unwrap()
        )
    }

    /// Default title the hub gives a new person
    pub fn default_title(&self) -> String {
        self.identity().chars().take(4).collect()
    }

    /// A complete signed client message
    pub fn envelope(&self, kind: &str, body: &str) -> Value {
        let jwk = self.jwk();
        let payload = SignedPayload::new(kind, body, &jwk).to_bytes();
        let signature: Signature = self.signing.sign(&payload);
        json!({
            "type": kind,
            "body": body,
            "publicKey": jwk,
            "signature": signature.to_bytes().to_vec(),
        })
    }

    pub fn person_envelope(&self, title: &str) -> Value {
        let body = json!({"identity": self.identity(), "title": title}).to_string();
        self.envelope("PERSON", &body)
    }
}

pub async fn send_json(socket: &mut Socket, value: &Value) {
    socket
        .send(Message::Text(value.to_string().into()))
        .await
        .expect("Failed to send frame");
}

/// Next text frame from the hub, parsed.
pub async fn recv_frame(socket: &mut Socket) -> ServerFrame {
    loop {
        let msg = tokio::time::timeout(FRAME_TIMEOUT, socket.next())
            .await
            .expect("Timed out waiting for a frame")
            .expect("Socket closed")
            .expect("WebSocket error");
        if let Message::Text(text) = msg {
            return ServerFrame::parse(text.as_str()).expect("Unexpected frame shape");
        }
    }
}

/// Skip frames until one matches `predicate`.
pub async fn recv_until<F>(socket: &mut Socket, mut predicate: F) -> ServerFrame
where
    F: FnMut(&ServerFrame) -> bool,
{
    loop {
        let frame = recv_frame(socket).await;
        if predicate(&frame) {
            return frame;
        }
    }
}

/// Connect, handshake and wait until the hub has answered.
pub async fn join(server: &TestServer, key: &TestKey) -> Socket {
    let mut socket = server.connect("/ws/").await;
    send_json(&mut socket, &key.envelope("HANDSHAKE", "")).await;
    recv_until(&mut socket, |frame| {
        matches!(frame, ServerFrame::Event(OutboundEvent::Persons(_)))
    })
    .await;
    socket
}
