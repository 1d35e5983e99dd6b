//! Transport layer abstraction for MorseChat.
//!
//! Defines the [`Transport`] trait that carries opaque ciphertext strings to
//! and from the broadcast hub. Inbound messages are pulled as discrete values
//! through [`Transport::recv`]; there are no callbacks.
//!
//! Implementations:
//! - [`relay::RelayTransport`]: WebSocket connection to a `morsechat-relay` hub
//! - [`loopback::LoopbackTransport`]: in-process broadcast hub for testing

pub mod loopback;
pub mod relay;

use std::fmt;

use morsechat_proto::relay::RelayCodecError;

/// Describes which kind of transport is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportType {
    /// WebSocket relay hub.
    Relay,
    /// In-process loopback for testing.
    Loopback,
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relay => write!(f, "Relay"),
            Self::Loopback => write!(f, "Loopback"),
        }
    }
}

/// Errors that can occur during transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection to the hub has been closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// The operation timed out before completing.
    #[error("transport operation timed out")]
    Timeout,

    /// The hub could not be reached.
    #[error("hub {0} is unreachable")]
    Unreachable(String),

    /// A hub frame could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] RelayCodecError),

    /// An underlying I/O error occurred.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Async transport trait for sending and receiving ciphertext.
///
/// # Invariant
///
/// Strings passed to [`Transport::send`] MUST already be encrypted. The
/// transport never inspects them, and the hub fans every send out to all
/// connected parties, the sender included.
pub trait Transport: Send + Sync {
    /// Hand a ciphertext to the hub for broadcast.
    ///
    /// `Ok(())` means the frame left this process; there is no delivery
    /// acknowledgment.
    fn send(
        &self,
        ciphertext: &str,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;

    /// Receive the next broadcast ciphertext.
    ///
    /// Blocks asynchronously until one arrives. Returns
    /// [`TransportError::ConnectionClosed`] once the connection is gone.
    fn recv(&self) -> impl std::future::Future<Output = Result<String, TransportError>> + Send;

    /// Check whether the connection to the hub is still up.
    fn is_connected(&self) -> bool;

    /// Return the type of this transport.
    fn transport_type(&self) -> TransportType;
}
