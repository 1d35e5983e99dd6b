//! Hub core: shared state, WebSocket handler, connection registry and
//! broadcast fan-out.
//!
//! Every connection is registered under a fresh [`ConnectionId`]. A
//! `SendMorse` from any connection is re-broadcast as `ReceiveMessage` to
//! every registered connection, the sender included. The ciphertext is
//! forwarded byte-for-byte; the hub holds no key and never looks inside.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use morsechat_proto::relay::{self, RelayMessage};
use tokio::sync::{RwLock, mpsc};

/// Default maximum allowed ciphertext size in bytes (64 KB).
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 64 * 1024;

/// Identifier assigned to each accepted connection.
pub type ConnectionId = u64;

/// Shared hub state holding the connection registry.
pub struct HubState {
    /// Maps each connection to the sender feeding its WebSocket writer task.
    connections: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<Message>>>,
    /// Source of connection identifiers.
    next_id: AtomicU64,
    /// Maximum allowed ciphertext size in bytes.
    max_payload_size: usize,
}

impl Default for HubState {
    fn default() -> Self {
        Self::new()
    }
}

impl HubState {
    /// Creates an empty hub using the default payload size limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_MAX_PAYLOAD_SIZE)
    }

    /// Creates an empty hub with a custom payload size limit.
    #[must_use]
    pub fn with_config(max_payload_size: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            max_payload_size,
        }
    }

    /// Maximum ciphertext size accepted for broadcast.
    #[must_use]
    pub const fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }

    /// Allocates the next connection identifier.
    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Registers a connection, returning the number of registered
    /// connections afterwards.
    pub async fn register(&self, id: ConnectionId, sender: mpsc::UnboundedSender<Message>) -> usize {
        let mut conns = self.connections.write().await;
        conns.insert(id, sender);
        conns.len()
    }

    /// Removes a connection, returning its sender if it was registered.
    pub async fn unregister(&self, id: ConnectionId) -> Option<mpsc::UnboundedSender<Message>> {
        let mut conns = self.connections.write().await;
        conns.remove(&id)
    }

    /// Number of currently registered connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Sends `msg` to every registered connection exactly once.
    ///
    /// The message is encoded a single time and pushed into each writer
    /// channel. Messages from one sender reach every connection in the order
    /// that sender issued them; broadcasts from different senders may
    /// interleave differently per connection. Connections whose channel has
    /// closed are unregistered afterwards.
    ///
    /// Returns the number of connections the message was handed to.
    pub async fn broadcast(&self, msg: &RelayMessage) -> usize {
        let bytes: axum::body::Bytes = match relay::encode(msg) {
            Ok(b) => b.into(),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode broadcast");
                return 0;
            }
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        {
            let conns = self.connections.read().await;
            for (id, sender) in conns.iter() {
                if sender.send(Message::Binary(bytes.clone())).is_ok() {
                    delivered += 1;
                } else {
                    dead.push(*id);
                }
            }
        }

        for id in dead {
            tracing::warn!(connection_id = id, "writer channel closed, unregistering");
            self.unregister(id).await;
        }

        delivered
    }

    /// Sends a message to a single connection, if it is still registered.
    pub async fn send_to(&self, id: ConnectionId, msg: &RelayMessage) -> bool {
        let conns = self.connections.read().await;
        let Some(sender) = conns.get(&id) else {
            return false;
        };
        match relay::encode(msg) {
            Ok(bytes) => sender.send(Message::Binary(bytes.into())).is_ok(),
            Err(e) => {
                tracing::error!(connection_id = id, error = %e, "failed to encode message");
                false
            }
        }
    }

    /// Send a WebSocket Close frame to all connected clients.
    ///
    /// Each writer task forwards the close frame, which lets the client-side
    /// reader detect the disconnect. Used for graceful shutdown and testing.
    pub async fn close_all_connections(&self) {
        let conns = self.connections.read().await;
        for (id, sender) in conns.iter() {
            tracing::info!(connection_id = id, "sending close frame");
            let _ = sender.send(Message::Close(None));
        }
    }
}

/// Handles an upgraded WebSocket connection for a single client.
///
/// The connection lifecycle:
/// 1. Allocate a connection id and register the writer channel.
/// 2. Send `Welcome` directly on the socket (always the first frame).
/// 3. Spawn the writer task draining the channel into the socket.
/// 4. Read frames, broadcasting each `SendMorse`.
/// 5. On disconnect, unregister. No other state is touched.
pub async fn handle_socket(socket: WebSocket, state: Arc<HubState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let id = state.next_connection_id();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let peers = state.register(id, tx).await;

    tracing::info!(connection_id = id, peers = peers, "client connected");

    let welcome = RelayMessage::Welcome {
        connection_id: id,
        peers: u32::try_from(peers).unwrap_or(u32::MAX),
    };
    if let Err(e) = send_relay_msg(&mut ws_sender, &welcome).await {
        tracing::warn!(connection_id = id, error = %e, "failed to send Welcome");
        state.unregister(id).await;
        return;
    }

    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                tracing::warn!(connection_id = id, "WebSocket write failed");
                break;
            }
        }
    });

    let reader_state = Arc::clone(&state);
    let mut read_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            match msg {
                Message::Binary(data) => {
                    handle_binary_message(id, &data, &reader_state).await;
                }
                Message::Close(_) => {
                    tracing::debug!(connection_id = id, "received close frame");
                    break;
                }
                _ => {
                    // Ignore text, ping, pong frames.
                }
            }
        }
    });

    tokio::select! {
        _ = &mut read_task => {
            write_task.abort();
        }
        _ = &mut write_task => {
            read_task.abort();
        }
    }

    state.unregister(id).await;
    tracing::info!(connection_id = id, "client disconnected");
}

/// Handles one binary frame from a connection.
///
/// This is the single dispatch point for inbound `SendMorse`, so each one
/// produces exactly one broadcast.
async fn handle_binary_message(id: ConnectionId, data: &[u8], state: &Arc<HubState>) {
    let msg = match relay::decode(data) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(connection_id = id, error = %e, "failed to decode message");
            let err = RelayMessage::Error {
                reason: format!("malformed frame: {e}"),
            };
            state.send_to(id, &err).await;
            return;
        }
    };

    match msg {
        RelayMessage::SendMorse { ciphertext } => {
            if ciphertext.len() > state.max_payload_size {
                tracing::warn!(
                    connection_id = id,
                    size = ciphertext.len(),
                    max = state.max_payload_size,
                    "payload exceeds size limit"
                );
                let err = RelayMessage::Error {
                    reason: format!(
                        "payload too large: {} bytes (max {})",
                        ciphertext.len(),
                        state.max_payload_size
                    ),
                };
                state.send_to(id, &err).await;
                return;
            }

            let payload_len = ciphertext.len();
            let delivered = state
                .broadcast(&RelayMessage::ReceiveMessage { ciphertext })
                .await;
            tracing::debug!(
                connection_id = id,
                payload_len = payload_len,
                delivered = delivered,
                "broadcast payload"
            );
        }
        other => {
            tracing::warn!(
                connection_id = id,
                msg = ?other,
                "unexpected message type from client"
            );
        }
    }
}

/// Encodes and sends a relay message directly on a WebSocket sender.
async fn send_relay_msg(
    ws_sender: &mut (impl SinkExt<Message, Error = axum::Error> + Unpin),
    msg: &RelayMessage,
) -> Result<(), String> {
    let bytes = relay::encode(msg).map_err(|e| e.to_string())?;
    ws_sender
        .send(Message::Binary(bytes.into()))
        .await
        .map_err(|e| format!("WebSocket send error: {e}"))
}

/// Starts the hub on the given address and returns the bound address and a
/// join handle.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(HubState::new())).await
}

/// Starts the hub with a pre-configured [`HubState`].
///
/// Serves the WebSocket endpoint on `/ws` and a liveness probe on
/// `/health`.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<HubState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = axum::Router::new()
        .route("/ws", axum::routing::get(ws_handler))
        .route("/health", axum::routing::get(health_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "hub server error");
        }
    });

    Ok((bound_addr, handle))
}

/// axum handler that upgrades an HTTP request to a WebSocket connection.
async fn ws_handler(
    ws: axum::extract::ws::WebSocketUpgrade,
    axum::extract::State(state): axum::extract::State<Arc<HubState>>,
) -> impl axum::response::IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Liveness probe.
async fn health_handler() -> &'static str {
    "ok"
}
