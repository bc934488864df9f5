//! Shared channel key for secure nodes

use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit},
};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};

/// Nonce size for ChaCha20-Poly1305 (12 bytes)
pub const NONCE_SIZE: usize = 12;

/// Key size (32 bytes)
pub const KEY_SIZE: usize = 32;

const DERIVE_CONTEXT: &str = "netlab 2024-01-01 secure node channel key";

/// Symmetric key shared by every secure node of a session
#[derive(Clone)]
pub struct ChannelKey {
    key: [u8; KEY_SIZE],
}

impl std::fmt::Debug for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelKey").finish_non_exhaustive()
    }
}

impl ChannelKey {
    /// Derive a key from a shared secret
    pub fn derive(secret: &str) -> Self {
        Self {
            key: blake3::derive_key(DERIVE_CONTEXT, secret.as_bytes()),
        }
    }

    /// Seal a plaintext under a fresh random nonce
    pub fn seal(&self, plaintext: &[u8]) -> CryptoResult<SealedPayload> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.key)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        Ok(SealedPayload {
            nonce: nonce_bytes,
            ciphertext,
        })
    }

    /// Open a sealed payload
    pub fn open(&self, sealed: &SealedPayload) -> CryptoResult<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.key)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

        cipher
            .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
    }
}

/// A payload sealed by a [`ChannelKey`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedPayload {
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}
