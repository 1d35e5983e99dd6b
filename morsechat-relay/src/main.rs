//! `MorseChat` hub -- stateless broadcast relay.
//!
//! An axum WebSocket server that fans every encrypted frame out to all
//! connected clients, the sender included. The hub never holds the cipher
//! key and never sees plaintext.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:4000
//! cargo run --bin morsechat-relay
//!
//! # Run on custom address
//! cargo run --bin morsechat-relay -- --bind 127.0.0.1:8080
//!
//! # Or via environment variable
//! MORSECHAT_RELAY_ADDR=127.0.0.1:8080 cargo run --bin morsechat-relay
//! ```

use std::sync::Arc;

use clap::Parser;
use morsechat_relay::config::{RelayCliArgs, RelayConfig};
use morsechat_relay::hub::{self, HubState};

#[tokio::main]
async fn main() {
    let cli = RelayCliArgs::parse();

    let config = match RelayConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting morsechat hub");

    let state = Arc::new(HubState::with_config(config.max_payload_size));

    match hub::start_server_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "hub listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "hub server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start hub");
            std::process::exit(1);
        }
    }
}
