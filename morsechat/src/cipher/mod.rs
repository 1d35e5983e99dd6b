//! Symmetric cipher layer for MorseChat.
//!
//! Defines the [`Cipher`] trait for turning a plaintext frame into an opaque
//! ciphertext string and back. The cipher is the only boundary where frame
//! plaintext exists: everything handed to
//! [`Transport::send`](crate::transport::Transport::send) has already been
//! encrypted, and everything from
//! [`Transport::recv`](crate::transport::Transport::recv) must be decrypted
//! before it is split.
//!
//! The key is a pre-shared secret supplied through configuration. There is
//! no key exchange: anyone holding the key can read and forge messages.

pub mod shared_key;

use std::fmt;

use zeroize::Zeroizing;

pub use shared_key::SharedKeyCipher;

/// Errors that can occur during cipher operations.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    /// The configured key was empty.
    #[error("cipher key must not be empty")]
    EmptyKey,

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed (wrong key, tampered or truncated ciphertext).
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// The ciphertext authenticated but the plaintext is not UTF-8.
    #[error("decrypted payload is not valid UTF-8")]
    InvalidUtf8,
}

/// Trait for encrypting and decrypting frames.
///
/// # Invariant
///
/// `decrypt(encrypt(p)) == Ok(p)` for every `p`, including the empty string.
/// A failed decryption is always an `Err`, never an empty `Ok`.
pub trait Cipher: Send + Sync {
    /// Encrypt a plaintext frame into a transport-safe string.
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError>;

    /// Decrypt a ciphertext string back into the plaintext frame.
    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError>;
}

/// A pre-shared cipher key as read from configuration.
///
/// The backing buffer is zeroized on drop and the value never shows up in
/// `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct CipherKey(Zeroizing<String>);

impl CipherKey {
    /// Wrap a key string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(Zeroizing::new(key.into()))
    }

    /// Borrow the raw key material.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the key is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CipherKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cipher_key_debug_is_redacted() {
        let key = CipherKey::new("hunter2");
        let debug = format!("{key:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn cipher_key_exposes_material() {
        let key = CipherKey::new("k");
        assert_eq!(key.expose(), "k");
        assert!(!key.is_empty());
        assert!(CipherKey::new("").is_empty());
    }
}
