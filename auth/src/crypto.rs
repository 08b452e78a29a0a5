//! Encryption of cached credentials.
//!
//! Tokens sitting in the refresh coordinator's cache are encrypted with
//! AES-256-GCM. A fresh 96-bit nonce is drawn for every encryption, so one
//! cipher instance can be shared freely across tasks.
//!
//! # Key management
//!
//! The cache is process-local and never persisted, so a random per-process
//! key ([`AesGcmTokenCipher::generate`]) is sufficient. Deployments that want
//! a fixed key can supply 32 bytes directly or base64-encoded through
//! `TOKEN_CACHE_ENCRYPTION_KEY`.

use crate::error::{AuthError, Result};
use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::sync::Arc;

/// Environment variable holding an optional base64 AES-256 key.
pub const ENCRYPTION_KEY_ENV: &str = "TOKEN_CACHE_ENCRYPTION_KEY";

/// Ciphertext plus the metadata needed to decrypt it.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedToken {
    /// 12-byte GCM nonce.
    pub nonce: Vec<u8>,
    /// Ciphertext with the authentication tag appended.
    pub ciphertext: Vec<u8>,
}

impl std::fmt::Debug for EncryptedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedToken")
            .field("nonce_len", &self.nonce.len())
            .field("ciphertext_len", &self.ciphertext.len())
            .finish()
    }
}

/// Encrypts tokens before they are cached and decrypts them on read.
pub trait TokenCipher: Send + Sync {
    /// Encrypt a token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EncryptionFailed` if the cipher rejects the input.
    fn encrypt(&self, token: &str) -> Result<EncryptedToken>;

    /// Decrypt a previously encrypted token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::DecryptionFailed` on a malformed nonce, an
    /// authentication tag mismatch, or non-UTF-8 plaintext.
    fn decrypt(&self, encrypted: &EncryptedToken) -> Result<String>;
}

/// AES-256-GCM token cipher.
#[derive(Clone)]
pub struct AesGcmTokenCipher {
    /// Wrapped in Arc so clones share the key schedule.
    cipher: Arc<Aes256Gcm>,
}

impl AesGcmTokenCipher {
    /// Create a cipher from raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidKey` if the key is not exactly 32 bytes.
    pub fn from_key(key: &[u8]) -> Result<Self> {
        if key.len() != 32 {
            return Err(AuthError::InvalidKey(
                "Encryption key must be exactly 32 bytes (256 bits) for AES-256-GCM".to_string(),
            ));
        }

        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| AuthError::InvalidKey(format!("Failed to initialize AES-256-GCM cipher: {e}")))?;

        Ok(Self {
            cipher: Arc::new(cipher),
        })
    }

    /// Create a cipher from a base64-encoded 32-byte key.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidKey` if the value is not valid base64 or
    /// does not decode to 32 bytes.
    pub fn from_base64_key(encoded: &str) -> Result<Self> {
        let key = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AuthError::InvalidKey(format!("Key is not valid base64: {e}")))?;
        Self::from_key(&key)
    }

    /// Create a cipher with a random key that lives only as long as the process.
    #[must_use]
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        Self {
            cipher: Arc::new(Aes256Gcm::new(&key)),
        }
    }

    /// Use `TOKEN_CACHE_ENCRYPTION_KEY` when set, otherwise a random key.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidKey` if the variable is set but malformed.
    pub fn from_env_or_generate() -> Result<Self> {
        match std::env::var(ENCRYPTION_KEY_ENV) {
            Ok(encoded) if !encoded.trim().is_empty() => Self::from_base64_key(&encoded),
            _ => {
                tracing::debug!("No token cache key configured, using a per-process key");
                Ok(Self::generate())
            }
        }
    }
}

impl TokenCipher for AesGcmTokenCipher {
    fn encrypt(&self, token: &str) -> Result<EncryptedToken> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = self
            .cipher
            .encrypt(&nonce, token.as_bytes())
            .map_err(|e| AuthError::EncryptionFailed(e.to_string()))?;

        Ok(EncryptedToken {
            nonce: nonce.to_vec(),
            ciphertext,
        })
    }

    fn decrypt(&self, encrypted: &EncryptedToken) -> Result<String> {
        if encrypted.nonce.len() != 12 {
            return Err(AuthError::DecryptionFailed(
                "Invalid nonce length (expected 12 bytes)".to_string(),
            ));
        }

        let nonce = Nonce::from_slice(&encrypted.nonce);

        let plaintext = self
            .cipher
            .decrypt(nonce, encrypted.ciphertext.as_ref())
            .map_err(|e| AuthError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e| AuthError::DecryptionFailed(e.to_string()))
    }
}
