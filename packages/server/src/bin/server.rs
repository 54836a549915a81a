//! Presence and chat hub server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin huddle-server -- --port 8080
//! ```

use clap::Parser;
use huddle_server::{config::ServerCli, run_server};
use huddle_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let config = match ServerCli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Run the server
    if let Err(e) = run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
