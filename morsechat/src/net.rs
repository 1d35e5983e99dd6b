//! Networking coordinator for wiring the TUI to the async chat pipeline.
//!
//! This module bridges the synchronous TUI event loop (crossterm poll-based)
//! with the async [`ChatSession`] / [`RelayTransport`] stack. It spawns
//! background tokio tasks and communicates with the main thread via
//! [`NetCommand`] / [`NetEvent`] channels.
//!
//! ```text
//! TUI (main thread)  ←── NetEvent ───  tokio background tasks
//!                     ─── NetCommand →
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::chat::{ChatEntry, ChatError, ChatSession};
use crate::cipher::{CipherKey, SharedKeyCipher};
use crate::transport::relay::{RelayOptions, RelayTransport};

type RelaySession = ChatSession<SharedKeyCipher, RelayTransport>;

/// Commands sent from the TUI main loop to the networking background tasks.
#[derive(Debug)]
pub enum NetCommand {
    /// Encode, encrypt and broadcast a line of text.
    SendMessage {
        /// The text as typed.
        text: String,
    },
    /// Close the hub connection and stop the background tasks.
    Shutdown,
}

/// Events sent from the networking background tasks to the TUI main loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetEvent {
    /// A broadcast was received and decrypted.
    MessageReceived {
        /// The appended incoming entry.
        entry: ChatEntry,
    },
    /// A message was encrypted and handed to the hub.
    MessageSent {
        /// The appended outgoing entry.
        entry: ChatEntry,
    },
    /// Connection status update.
    ConnectionStatus {
        /// Whether currently connected to the hub.
        connected: bool,
    },
    /// A non-fatal error occurred in the networking layer.
    Error(String),
}

/// Configuration for the networking layer.
#[derive(Debug, Clone)]
pub struct NetConfig {
    /// WebSocket URL of the hub (e.g., `ws://127.0.0.1:4000/ws`).
    pub server_url: String,
    /// Pre-shared cipher key.
    pub cipher_key: CipherKey,
    /// Timeout for connecting to the hub.
    pub connect_timeout: Duration,
    /// Channel capacity for command/event mpsc channels. Zero is treated as one.
    pub channel_capacity: usize,
}

impl NetConfig {
    /// Creates a `NetConfig` with default timeout and channel capacity.
    #[must_use]
    pub fn new(server_url: impl Into<String>, cipher_key: CipherKey) -> Self {
        let defaults = RelayOptions::default();
        Self {
            server_url: server_url.into(),
            cipher_key,
            connect_timeout: defaults.connect_timeout,
            channel_capacity: defaults.channel_capacity,
        }
    }
}

/// Spawn the networking background tasks and return channel handles.
///
/// Derives the cipher, connects to the hub, and spawns:
///
/// 1. A **receive loop** that calls `session.receive_one()` and forwards
///    each entry as [`NetEvent::MessageReceived`].
/// 2. A **command handler** that listens for [`NetCommand`]s and calls
///    `session.send_text()`.
///
/// # Errors
///
/// Returns [`ChatError::Cipher`] for an unusable key and
/// [`ChatError::Transport`] if the hub cannot be reached. The caller should
/// fall back to offline mode.
pub async fn spawn_net(
    config: NetConfig,
) -> Result<(mpsc::Sender<NetCommand>, mpsc::Receiver<NetEvent>), ChatError> {
    let cipher = SharedKeyCipher::new(&config.cipher_key)?;

    let options = RelayOptions {
        connect_timeout: config.connect_timeout,
        channel_capacity: config.channel_capacity,
        ..RelayOptions::default()
    };
    let transport = RelayTransport::connect_with(&config.server_url, options).await?;

    let session = Arc::new(ChatSession::new(cipher, transport));

    let capacity = config.channel_capacity.max(1);
    let (cmd_tx, cmd_rx) = mpsc::channel::<NetCommand>(capacity);
    let (evt_tx, evt_rx) = mpsc::channel::<NetEvent>(capacity);

    let _ = evt_tx
        .send(NetEvent::ConnectionStatus { connected: true })
        .await;

    tokio::spawn(receive_loop(Arc::clone(&session), evt_tx.clone()));
    tokio::spawn(command_handler(session, cmd_rx, evt_tx));

    Ok((cmd_tx, evt_rx))
}

/// Background task: continuously receive broadcasts from the hub.
///
/// Undecryptable payloads are reported and skipped. A closed connection
/// ends the loop.
async fn receive_loop(session: Arc<RelaySession>, evt_tx: mpsc::Sender<NetEvent>) {
    loop {
        let event = match session.receive_one().await {
            Ok(entry) => NetEvent::MessageReceived { entry },
            Err(e) if e.is_disconnect() => {
                tracing::info!("hub connection lost, receive loop exiting");
                let _ = evt_tx
                    .send(NetEvent::ConnectionStatus { connected: false })
                    .await;
                break;
            }
            Err(ChatError::Cipher(e)) => NetEvent::Error(format!("message not understood: {e}")),
            Err(e) => {
                tracing::warn!(error = %e, "receive error");
                NetEvent::Error(format!("receive error: {e}"))
            }
        };

        if evt_tx.send(event).await.is_err() {
            // TUI dropped; exit.
            break;
        }
    }
}

/// Background task: handle commands from the TUI main loop.
async fn command_handler(
    session: Arc<RelaySession>,
    mut cmd_rx: mpsc::Receiver<NetCommand>,
    evt_tx: mpsc::Sender<NetEvent>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            NetCommand::SendMessage { text } => match session.send_text(&text).await {
                Ok(Some(entry)) => {
                    let _ = evt_tx.send(NetEvent::MessageSent { entry }).await;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "send failed");
                    let _ = evt_tx
                        .send(NetEvent::Error(format!("send failed: {e}")))
                        .await;
                }
            },
            NetCommand::Shutdown => {
                tracing::info!("net command handler shutting down");
                break;
            }
        }
    }
    session.transport().close().await;
}
