//! WebSocket relay transport for MorseChat.
//!
//! Implements the [`Transport`] trait over a WebSocket connection to a
//! `morsechat-relay` hub. The hub broadcasts every ciphertext it receives to
//! all connected clients, so this transport also receives its own sends.
//!
//! The connection is an owned handle: creating a [`RelayTransport`] opens
//! it, [`RelayTransport::close`] or dropping the handle tears it down. There
//! is no process-wide socket.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use morsechat_proto::relay::{self, RelayMessage};

use super::{Transport, TransportError, TransportType};

/// Type alias for the write half of a WebSocket connection.
type WsSender = futures_util::stream::SplitSink<
    WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    Message,
>;

/// Type alias for the read half of a WebSocket connection.
type WsReader =
    futures_util::stream::SplitStream<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>>;

/// Tunables for [`RelayTransport::connect_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayOptions {
    /// Timeout for the WebSocket handshake.
    pub connect_timeout: Duration,
    /// Timeout for the hub's `Welcome` frame.
    pub welcome_timeout: Duration,
    /// Capacity of the inbound ciphertext channel. Zero is treated as one.
    pub channel_capacity: usize,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            welcome_timeout: Duration::from_secs(5),
            channel_capacity: 256,
        }
    }
}

/// WebSocket relay transport implementing the [`Transport`] trait.
///
/// Created via [`RelayTransport::connect`], which opens the WebSocket,
/// waits for the hub's `Welcome`, and spawns a background reader task that
/// feeds received ciphertexts into a channel.
pub struct RelayTransport {
    /// The hub URL (ws:// or wss://).
    server_url: String,
    /// Identifier the hub assigned to this connection.
    connection_id: u64,
    /// Write half of the WebSocket connection.
    ws_sender: Mutex<WsSender>,
    /// Ciphertexts pushed by the background reader task.
    incoming: Mutex<mpsc::Receiver<String>>,
    /// Whether the WebSocket connection is active.
    connected: Arc<AtomicBool>,
    /// Background reader task, aborted on close or drop.
    reader_handle: tokio::task::JoinHandle<()>,
}

impl RelayTransport {
    /// Connect to a hub with default [`RelayOptions`].
    ///
    /// # Errors
    ///
    /// See [`RelayTransport::connect_with`].
    pub async fn connect(server_url: &str) -> Result<Self, TransportError> {
        Self::connect_with(server_url, RelayOptions::default()).await
    }

    /// Connect to a hub.
    ///
    /// 1. Establishes the WebSocket connection (`connect_timeout`)
    /// 2. Waits for the hub's `Welcome` (`welcome_timeout`)
    /// 3. Spawns a background task that reads broadcast frames
    ///
    /// Once this returns, every later broadcast is delivered to this
    /// transport.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Timeout`] if the handshake or `Welcome` times out.
    /// - [`TransportError::Unreachable`] if nothing is listening at the URL.
    /// - [`TransportError::ConnectionClosed`] if the hub hangs up first.
    /// - [`TransportError::Io`] for other handshake failures.
    pub async fn connect_with(
        server_url: &str,
        options: RelayOptions,
    ) -> Result<Self, TransportError> {
        let (ws_stream, _response) =
            tokio::time::timeout(options.connect_timeout, connect_async(server_url))
                .await
                .map_err(|_| {
                    tracing::warn!(url = server_url, "hub WebSocket connect timed out");
                    TransportError::Timeout
                })?
                .map_err(|e| {
                    tracing::warn!(url = server_url, err = %e, "hub WebSocket connect failed");
                    map_ws_connect_error(server_url, e)
                })?;

        let (ws_sender, mut ws_reader) = ws_stream.split();

        let welcome = tokio::time::timeout(options.welcome_timeout, ws_reader.next())
            .await
            .map_err(|_| {
                tracing::warn!(url = server_url, "hub welcome timed out");
                TransportError::Timeout
            })?;

        let connection_id = match welcome {
            Some(Ok(Message::Binary(data))) => match relay::decode(&data)? {
                RelayMessage::Welcome {
                    connection_id,
                    peers,
                } => {
                    tracing::info!(url = server_url, connection_id, peers, "joined hub");
                    connection_id
                }
                RelayMessage::Error { reason } => {
                    tracing::warn!(reason = %reason, "hub rejected connection");
                    return Err(TransportError::Io(std::io::Error::other(format!(
                        "hub rejected connection: {reason}"
                    ))));
                }
                other => {
                    tracing::warn!(?other, "unexpected hub frame before welcome");
                    return Err(TransportError::Io(std::io::Error::other(
                        "unexpected frame before welcome",
                    )));
                }
            },
            Some(Ok(Message::Close(_))) | None => {
                tracing::warn!("hub closed connection before welcome");
                return Err(TransportError::ConnectionClosed);
            }
            Some(Ok(_)) => {
                return Err(TransportError::Io(std::io::Error::other(
                    "unexpected non-binary frame before welcome",
                )));
            }
            Some(Err(e)) => {
                tracing::warn!(err = %e, "WebSocket error before welcome");
                return Err(TransportError::Io(std::io::Error::other(e)));
            }
        };

        let (tx, rx) = mpsc::channel(options.channel_capacity.max(1));
        let connected = Arc::new(AtomicBool::new(true));
        let reader_handle = tokio::spawn(reader_loop(ws_reader, tx, Arc::clone(&connected)));

        Ok(Self {
            server_url: server_url.to_string(),
            connection_id,
            ws_sender: Mutex::new(ws_sender),
            incoming: Mutex::new(rx),
            connected,
            reader_handle,
        })
    }

    /// Return the hub URL this transport is connected to.
    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Return the identifier the hub assigned to this connection.
    #[must_use]
    pub const fn connection_id(&self) -> u64 {
        self.connection_id
    }

    /// Close the connection.
    ///
    /// Sends a WebSocket Close frame and stops the reader task. Pending
    /// [`Transport::recv`] calls drain what was already buffered, then
    /// return [`TransportError::ConnectionClosed`]. Calling this twice is
    /// harmless.
    pub async fn close(&self) {
        let was_connected = self.connected.swap(false, Ordering::AcqRel);
        if was_connected {
            let mut sender = self.ws_sender.lock().await;
            if let Err(e) = sender.send(Message::Close(None)).await {
                tracing::debug!(err = %e, "close frame not sent");
            }
            tracing::info!(connection_id = self.connection_id, "hub connection closed");
        }
        self.reader_handle.abort();
    }
}

impl Drop for RelayTransport {
    fn drop(&mut self) {
        self.reader_handle.abort();
    }
}

impl Transport for RelayTransport {
    /// Submit a ciphertext to the hub as a `SendMorse` frame.
    ///
    /// # Errors
    ///
    /// - [`TransportError::ConnectionClosed`] if the connection is down.
    /// - [`TransportError::Codec`] if the frame cannot be encoded.
    async fn send(&self, ciphertext: &str) -> Result<(), TransportError> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(TransportError::ConnectionClosed);
        }

        let msg = RelayMessage::SendMorse {
            ciphertext: ciphertext.to_string(),
        };
        let bytes = relay::encode(&msg)?;

        let mut sender = self.ws_sender.lock().await;
        sender
            .send(Message::Binary(bytes.into()))
            .await
            .map_err(|e| {
                tracing::warn!(err = %e, "hub send failed");
                self.connected.store(false, Ordering::Release);
                TransportError::ConnectionClosed
            })?;

        tracing::debug!(payload_len = ciphertext.len(), "ciphertext sent to hub");
        Ok(())
    }

    /// Receive the next broadcast ciphertext.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectionClosed`] once the reader task has
    /// exited and the buffer is drained.
    async fn recv(&self) -> Result<String, TransportError> {
        let mut rx = self.incoming.lock().await;
        rx.recv().await.ok_or(TransportError::ConnectionClosed)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn transport_type(&self) -> TransportType {
        TransportType::Relay
    }
}

/// Background task that reads hub frames and forwards ciphertexts.
///
/// `ReceiveMessage` payloads go into `tx`. `Error` frames are logged.
/// Malformed frames are logged and skipped without dropping the connection.
/// Sets `connected` to `false` when the WebSocket closes or errors out.
async fn reader_loop(mut ws_reader: WsReader, tx: mpsc::Sender<String>, connected: Arc<AtomicBool>) {
    while let Some(msg_result) = ws_reader.next().await {
        match msg_result {
            Ok(Message::Binary(data)) => match relay::decode(&data) {
                Ok(RelayMessage::ReceiveMessage { ciphertext }) => {
                    tracing::trace!(payload_len = ciphertext.len(), "broadcast received");
                    if tx.send(ciphertext).await.is_err() {
                        break;
                    }
                }
                Ok(RelayMessage::Error { reason }) => {
                    tracing::warn!(reason = %reason, "hub reported error");
                }
                Ok(other) => {
                    tracing::debug!(?other, "unexpected hub frame");
                }
                Err(e) => {
                    tracing::warn!(err = %e, "malformed hub frame, skipping");
                }
            },
            Ok(Message::Close(_)) => {
                tracing::info!("hub closed the connection");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(err = %e, "hub WebSocket read error");
                break;
            }
        }
    }
    connected.store(false, Ordering::Release);
    tracing::debug!("hub reader task exiting");
}

/// Map a `tokio_tungstenite` connection error to a [`TransportError`].
fn map_ws_connect_error(url: &str, err: tokio_tungstenite::tungstenite::Error) -> TransportError {
    use tokio_tungstenite::tungstenite::Error as WsError;
    match err {
        WsError::Io(io_err)
            if matches!(
                io_err.kind(),
                std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::AddrNotAvailable
            ) =>
        {
            TransportError::Unreachable(url.to_string())
        }
        WsError::Io(io_err) => TransportError::Io(io_err),
        WsError::Http(response) => TransportError::Io(std::io::Error::other(format!(
            "hub HTTP error: status {}",
            response.status()
        ))),
        other => TransportError::Io(std::io::Error::other(format!(
            "hub connection error: {other}"
        ))),
    }
}
