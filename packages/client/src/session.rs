//! Interactive chat session over one WebSocket.

use futures_util::{SinkExt, StreamExt};
use huddle_server::infrastructure::dto::websocket::{InboundMessageDto, ServerFrame};
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::{
    error::ClientError,
    input::{HELP, Input},
    render::Renderer,
    signer::ClientKey,
};

/// Connection settings of a session
pub struct ClientOptions {
    /// WebSocket URL of the room, e.g. `ws://127.0.0.1:8080/ws/`
    pub url: String,
    pub key: ClientKey,
    /// Title to announce right after the handshake
    pub title: Option<String>,
}

/// Connect, identify and chat until `/quit`, end of input or the hub hangs up.
pub async fn run_client(options: ClientOptions) -> Result<(), ClientError> {
    let ClientOptions { url, key, title } = options;

    let (socket, _) = connect_async(url.as_str()).await?;
    tracing::info!("Connected to {}", url);
    println!("connected to {url} as {}", key.identity());
    println!("{HELP}");
    let (mut sender, mut receiver) = socket.split();

    sender.send(encode(&key.handshake())?).await?;
    if let Some(title) = title.as_deref() {
        sender.send(encode(&key.person(title))?).await?;
    }

    // Print incoming frames
    let mut recv_task = tokio::spawn(async move {
        let mut renderer = Renderer::new();
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => match ServerFrame::parse(text.as_str()) {
                    Ok(frame) => {
                        for line in renderer.render(&frame) {
                            println!("{line}");
                        }
                    }
                    Err(e) => tracing::warn!("Unexpected frame from hub: {}", e),
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("WebSocket error: {}", e);
                    break;
                }
            }
        }
        println!("* disconnected by the hub, press Enter to exit");
    });

    let (line_tx, mut line_rx) = mpsc::unbounded_channel();
    let prompt = tokio::task::spawn_blocking(move || read_lines(line_tx));

    loop {
        tokio::select! {
            line = line_rx.recv() => {
                let Some(line) = line else { break };
                let outbound = match Input::parse(&line) {
                    Input::Say(text) => key.message(&text),
                    Input::Title(title) => key.person(&title),
                    Input::Help => {
                        println!("{HELP}");
                        continue;
                    }
                    Input::Empty => continue,
                    Input::Quit => break,
                };
                sender.send(encode(&outbound)?).await?;
            }
            _ = &mut recv_task => break,
        }
    }

    let _ = sender.send(Message::Close(None)).await;
    recv_task.abort();
    drop(line_rx);

    // The prompt thread stops after `/quit`, end of input or the next line.
    match prompt.await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!("Prompt task failed: {}", e);
            Ok(())
        }
    }
}

fn encode(message: &InboundMessageDto) -> Result<Message, ClientError> {
    Ok(Message::Text(serde_json::to_string(message)?.into()))
}

fn read_lines(tx: mpsc::UnboundedSender<String>) -> Result<(), ClientError> {
    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                let quit = Input::parse(&line) == Input::Quit;
                if tx.send(line).is_err() || quit {
                    return Ok(());
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(()),
            Err(e) => return Err(e.into()),
        }
    }
}
