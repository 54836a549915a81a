//! Interactive Huddle chat client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin huddle-client -- --title Alice
//! ```

use std::path::PathBuf;

use clap::Parser;
use huddle_client::{ClientOptions, run_client, signer::ClientKey};
use huddle_shared::logger::setup_logger;

#[derive(Debug, Parser)]
#[command(name = "huddle-client", version, about = "Chat on a Huddle hub")]
struct Cli {
    /// WebSocket URL of the room
    #[arg(long, env = "HUDDLE_URL", default_value = "ws://127.0.0.1:8080/ws/")]
    url: String,

    /// Where the signing key is kept (created on first run)
    #[arg(long, env = "HUDDLE_KEY_FILE", default_value = "huddle.key")]
    key_file: PathBuf,

    /// Title to announce after connecting
    #[arg(long)]
    title: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let cli = Cli::parse();
    let key = match ClientKey::load_or_create(&cli.key_file) {
        Ok(key) => key,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let options = ClientOptions {
        url: cli.url,
        key,
        title: cli.title,
    };
    if let Err(e) = run_client(options).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
