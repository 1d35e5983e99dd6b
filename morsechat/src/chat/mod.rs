//! Chat pipeline for MorseChat.
//!
//! Contains the [`ChatSession`], which runs the send pipeline
//! (encode -> combine -> encrypt -> transmit) and the receive pipeline
//! (receive -> decrypt -> split), appending each step's result to a
//! [`ChatLog`].

pub mod log;

use parking_lot::Mutex;

use morsechat_proto::frame::Frame;

use crate::cipher::{Cipher, CipherError};
use crate::transport::{Transport, TransportError};

pub use log::{ChatEntry, ChatLog, Direction};

/// Errors that can occur in the chat pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Encryption or decryption failed.
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    /// Transport-level send or receive failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl ChatError {
    /// Whether the underlying connection is gone for good.
    #[must_use]
    pub const fn is_disconnect(&self) -> bool {
        matches!(self, Self::Transport(TransportError::ConnectionClosed))
    }
}

/// One participant's view of the chat.
///
/// Owns the cipher and transport. The log sits behind a short-lived lock so
/// a receive loop and a sender can share the session through an `Arc`.
pub struct ChatSession<C: Cipher, T: Transport> {
    cipher: C,
    transport: T,
    log: Mutex<ChatLog>,
}

impl<C: Cipher, T: Transport> ChatSession<C, T> {
    /// Create a session with an empty log.
    pub fn new(cipher: C, transport: T) -> Self {
        Self {
            cipher,
            transport,
            log: Mutex::new(ChatLog::new()),
        }
    }

    /// Send `text` to the hub.
    ///
    /// Blank input (empty after trimming) is ignored and yields `Ok(None)`.
    /// Otherwise the original, untrimmed text is encoded, framed, encrypted
    /// and sent, and the resulting outgoing entry is appended and returned.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Cipher`] if encryption fails and
    /// [`ChatError::Transport`] if the hub cannot be reached. Nothing is
    /// appended on failure.
    pub async fn send_text(&self, text: &str) -> Result<Option<ChatEntry>, ChatError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let frame = Frame::from_text(text);
        let ciphertext = self.cipher.encrypt(&frame.to_wire())?;
        self.transport.send(&ciphertext).await?;

        tracing::debug!(
            morse_len = frame.morse.len(),
            payload_len = ciphertext.len(),
            "message sent"
        );

        let entry = ChatEntry::outgoing(frame);
        self.log.lock().push(entry.clone());
        Ok(Some(entry))
    }

    /// Wait for the next broadcast and append it as an incoming entry.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Transport`] when the connection closes and
    /// [`ChatError::Cipher`] when a payload cannot be decrypted. A failed
    /// decryption appends nothing and leaves the session usable.
    pub async fn receive_one(&self) -> Result<ChatEntry, ChatError> {
        let ciphertext = self.transport.recv().await?;
        self.handle_ciphertext(&ciphertext)
    }

    /// Decrypt, split and append one received ciphertext.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Cipher`] if `ciphertext` does not decrypt under
    /// this session's key.
    pub fn handle_ciphertext(&self, ciphertext: &str) -> Result<ChatEntry, ChatError> {
        let plaintext = self.cipher.decrypt(ciphertext).inspect_err(|e| {
            tracing::warn!(error = %e, payload_len = ciphertext.len(), "dropping undecryptable message");
        })?;

        let entry = ChatEntry::incoming(Frame::parse(&plaintext));
        self.log.lock().push(entry.clone());
        Ok(entry)
    }

    /// Snapshot of the log.
    #[must_use]
    pub fn history(&self) -> ChatLog {
        self.log.lock().clone()
    }

    /// Number of entries in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }

    /// Borrow the transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::SharedKeyCipher;
    use crate::transport::loopback::{LoopbackHub, LoopbackTransport};

    type Session = ChatSession<SharedKeyCipher, LoopbackTransport>;

    fn session(hub: &LoopbackHub, key: &str) -> Session {
        ChatSession::new(SharedKeyCipher::from_passphrase(key).unwrap(), hub.attach())
    }

    #[tokio::test]
    async fn send_appends_outgoing_entry() {
        let hub = LoopbackHub::new();
        let alice = session(&hub, "k");

        let entry = alice.send_text("SOS").await.unwrap().unwrap();

        assert_eq!(entry.direction, Direction::Outgoing);
        assert_eq!(entry.morse, "... --- ...");
        assert_eq!(entry.text, "SOS");
        assert_eq!(alice.len(), 1);
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let hub = LoopbackHub::new();
        let alice = session(&hub, "k");

        assert!(alice.send_text("").await.unwrap().is_none());
        assert!(alice.send_text("   \t").await.unwrap().is_none());
        assert!(alice.is_empty());
    }

    #[tokio::test]
    async fn untrimmed_text_is_kept() {
        let hub = LoopbackHub::new();
        let alice = session(&hub, "k");

        let entry = alice.send_text(" hi ").await.unwrap().unwrap();
        assert_eq!(entry.text, " hi ");
        assert_eq!(entry.morse, "/ .... .. /");
    }

    #[tokio::test]
    async fn peer_receives_decrypted_frame() {
        let hub = LoopbackHub::new();
        let alice = session(&hub, "k");
        let bob = session(&hub, "k");

        alice.send_text("SOS").await.unwrap();
        let entry = bob.receive_one().await.unwrap();

        assert_eq!(entry.direction, Direction::Incoming);
        assert_eq!(entry.morse, "... --- ...");
        assert_eq!(entry.text, "SOS");
    }

    #[tokio::test]
    async fn sender_sees_own_echo_as_incoming() {
        let hub = LoopbackHub::new();
        let alice = session(&hub, "k");

        alice.send_text("HI").await.unwrap();
        let echo = alice.receive_one().await.unwrap();

        assert_eq!(echo.direction, Direction::Incoming);
        let history = alice.history();
        assert_eq!(history.outgoing().count(), 1);
        assert_eq!(history.incoming().count(), 1);
    }

    #[tokio::test]
    async fn lossy_characters_are_dropped_from_morse_only() {
        let hub = LoopbackHub::new();
        let alice = session(&hub, "k");
        let bob = session(&hub, "k");

        alice.send_text("SOS!").await.unwrap();
        let entry = bob.receive_one().await.unwrap();

        assert_eq!(entry.morse, "... --- ...");
        assert_eq!(entry.text, "SOS!");
    }

    #[tokio::test]
    async fn wrong_key_is_a_cipher_error_and_appends_nothing() {
        let hub = LoopbackHub::new();
        let alice = session(&hub, "right");
        let eve = session(&hub, "wrong");

        alice.send_text("SECRET").await.unwrap();
        let err = eve.receive_one().await.unwrap_err();

        assert!(matches!(err, ChatError::Cipher(CipherError::Decryption(_))));
        assert!(!err.is_disconnect());
        assert!(eve.is_empty());
    }

    #[test]
    fn frame_without_delimiter_becomes_morse_only_entry() {
        let hub = LoopbackHub::new();
        let cipher = SharedKeyCipher::from_passphrase("k").unwrap();
        let ciphertext = cipher.encrypt("NOSPLIT").unwrap();
        let bob = ChatSession::new(cipher, hub.attach());

        let entry = bob.handle_ciphertext(&ciphertext).unwrap();
        assert_eq!(entry.morse, "NOSPLIT");
        assert_eq!(entry.text, "");
    }

    #[tokio::test]
    async fn closed_transport_is_a_disconnect() {
        let hub = LoopbackHub::new();
        let alice = session(&hub, "k");
        alice.transport().close().await;

        let err = alice.send_text("late").await.unwrap_err();
        assert!(err.is_disconnect());
        let err = alice.receive_one().await.unwrap_err();
        assert!(err.is_disconnect());
        assert!(alice.is_empty());
    }
}
