//! Mock token cipher.

use crate::crypto::{EncryptedToken, TokenCipher};
use crate::error::{AuthError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Reversible, non-secret cipher with switchable failures.
///
/// "Encrypts" by reversing the bytes. Clones share the failure switches.
///
/// **WARNING**: Do NOT use in production. It provides no confidentiality.
#[derive(Debug, Clone, Default)]
pub struct MockTokenCipher {
    fail_encrypt: Arc<AtomicBool>,
    fail_decrypt: Arc<AtomicBool>,
    encryptions: Arc<AtomicUsize>,
}

impl MockTokenCipher {
    /// Create a working mock cipher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock cipher whose encryption always fails.
    #[must_use]
    pub fn failing_encrypt() -> Self {
        let cipher = Self::new();
        cipher.fail_encrypt(true);
        cipher
    }

    /// Toggle encryption failures.
    pub fn fail_encrypt(&self, fail: bool) {
        self.fail_encrypt.store(fail, Ordering::SeqCst);
    }

    /// Toggle decryption failures.
    pub fn fail_decrypt(&self, fail: bool) {
        self.fail_decrypt.store(fail, Ordering::SeqCst);
    }

    /// Number of encryption calls.
    #[must_use]
    pub fn encryptions(&self) -> usize {
        self.encryptions.load(Ordering::SeqCst)
    }
}

impl TokenCipher for MockTokenCipher {
    fn encrypt(&self, token: &str) -> Result<EncryptedToken> {
        self.encryptions.fetch_add(1, Ordering::SeqCst);
        if self.fail_encrypt.load(Ordering::SeqCst) {
            return Err(AuthError::EncryptionFailed("mock encryption failure".into()));
        }

        Ok(EncryptedToken {
            nonce: vec![0; 12],
            ciphertext: token.bytes().rev().collect(),
        })
    }

    fn decrypt(&self, encrypted: &EncryptedToken) -> Result<String> {
        if self.fail_decrypt.load(Ordering::SeqCst) {
            return Err(AuthError::DecryptionFailed("mock decryption failure".into()));
        }

        let bytes: Vec<u8> = encrypted.ciphertext.iter().rev().copied().collect();
        String::from_utf8(bytes).map_err(|e| AuthError::DecryptionFailed(e.to_string()))
    }
}
