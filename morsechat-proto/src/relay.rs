//! Relay wire protocol types for the MorseChat hub.
//!
//! Defines the [`RelayMessage`] enum that is postcard-encoded and sent
//! over WebSocket binary frames between chat clients and the hub.

use serde::{Deserialize, Serialize};

/// Error type for relay message encode/decode.
#[derive(Debug, thiserror::Error)]
pub enum RelayCodecError {
    /// Serialization failed.
    #[error("relay encode error: {0}")]
    Encode(String),
    /// Deserialization failed.
    #[error("relay decode error: {0}")]
    Decode(String),
}

/// Messages exchanged between chat clients and the hub.
///
/// The hub never inspects `ciphertext`. It has no key, so the Morse and
/// text structure inside stays opaque end to end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayMessage {
    /// The hub greets a newly registered connection.
    ///
    /// Always the first message on a connection. Broadcasts sent after a
    /// client has seen this are guaranteed to reach it.
    Welcome {
        /// Identifier the hub assigned to this connection.
        connection_id: u64,
        /// Number of connections registered, this one included.
        peers: u32,
    },

    /// A client submits an encrypted frame for broadcast.
    SendMorse {
        /// Base64 ciphertext produced by the client cipher.
        ciphertext: String,
    },

    /// The hub delivers a broadcast frame to every connected client,
    /// including the one that sent it.
    ReceiveMessage {
        /// The ciphertext exactly as submitted.
        ciphertext: String,
    },

    /// The hub reports an error condition to a single client.
    Error {
        /// Human-readable error description.
        reason: String,
    },
}

/// Encodes a [`RelayMessage`] into bytes using postcard.
///
/// # Errors
///
/// Returns [`RelayCodecError::Encode`] if serialization fails.
pub fn encode(msg: &RelayMessage) -> Result<Vec<u8>, RelayCodecError> {
    postcard::to_allocvec(msg).map_err(|e| RelayCodecError::Encode(e.to_string()))
}

/// Decodes a [`RelayMessage`] from bytes using postcard.
///
/// # Errors
///
/// Returns [`RelayCodecError::Decode`] if the bytes are not a valid message.
pub fn decode(bytes: &[u8]) -> Result<RelayMessage, RelayCodecError> {
    postcard::from_bytes(bytes).map_err(|e| RelayCodecError::Decode(e.to_string()))
}
