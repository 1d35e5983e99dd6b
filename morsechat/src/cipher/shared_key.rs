//! ChaCha20-Poly1305 cipher keyed from a pre-shared passphrase.
//!
//! The passphrase is stretched with HKDF-SHA256 into a 256-bit key. Each
//! message gets a fresh random 96-bit nonce, and the wire text is
//! `base64(nonce || ciphertext || tag)`.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use hkdf::Hkdf;
use rand_core::{OsRng, RngCore};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::{Cipher, CipherError, CipherKey};

const HKDF_SALT: &[u8] = b"morsechat-shared-key-v1";
const HKDF_INFO: &[u8] = b"morsechat frame encryption";

/// Size of the ChaCha20-Poly1305 nonce in bytes.
const NONCE_SIZE: usize = 12;

/// Size of the Poly1305 authentication tag in bytes.
const TAG_SIZE: usize = 16;

/// Symmetric cipher shared by every participant holding the same key.
pub struct SharedKeyCipher {
    aead: ChaCha20Poly1305,
}

impl SharedKeyCipher {
    /// Derive a cipher from a pre-shared key.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::EmptyKey`] if `key` is empty.
    pub fn new(key: &CipherKey) -> Result<Self, CipherError> {
        if key.is_empty() {
            return Err(CipherError::EmptyKey);
        }

        let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), key.expose().as_bytes());
        let mut okm = Zeroizing::new([0u8; 32]);
        hk.expand(HKDF_INFO, &mut *okm)
            .map_err(|e| CipherError::Encryption(format!("key derivation failed: {e}")))?;

        let aead = ChaCha20Poly1305::new_from_slice(&*okm)
            .map_err(|e| CipherError::Encryption(format!("invalid key length: {e}")))?;

        Ok(Self { aead })
    }

    /// Convenience constructor from a raw key string.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::EmptyKey`] if `key` is empty.
    pub fn from_passphrase(key: &str) -> Result<Self, CipherError> {
        Self::new(&CipherKey::new(key))
    }
}

impl fmt::Debug for SharedKeyCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedKeyCipher").finish_non_exhaustive()
    }
}

impl Cipher for SharedKeyCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let sealed = self
            .aead
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CipherError::Encryption(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(BASE64.encode(out))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let raw = BASE64
            .decode(ciphertext.trim())
            .map_err(|e| CipherError::Decryption(format!("invalid base64: {e}")))?;

        if raw.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CipherError::Decryption(format!(
                "ciphertext too short: {} bytes",
                raw.len()
            )));
        }

        let (nonce_bytes, sealed) = raw.split_at(NONCE_SIZE);
        let plaintext = self
            .aead
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| CipherError::Decryption("authentication failed".to_string()))?;

        String::from_utf8(plaintext).map_err(|_| CipherError::InvalidUtf8)
    }
}
