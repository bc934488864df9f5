//! # netlab-crypto
//!
//! Payload sealing for the secure messaging node.
//!
//! Every secure node in a session derives the same [`ChannelKey`] from a
//! shared secret, so a payload sealed at one node can be opened at any other.
//! Sealing uses ChaCha20-Poly1305 with a random 96-bit nonce; the key is
//! derived with BLAKE3 in key-derivation mode.

pub mod channel_key;
pub mod error;

pub use channel_key::{ChannelKey, SealedPayload, KEY_SIZE, NONCE_SIZE};
pub use error::{CryptoError, CryptoResult};
