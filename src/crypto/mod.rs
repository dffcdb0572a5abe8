//! Cryptographic primitives for the security engine.
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption with AAD (`cipher`)
//! - PBKDF2-HMAC-SHA256 key derivation and the named profiles (`kdf`)
//! - CSPRNG helpers with bounded retry (`random`)
//! - A bounded worker pool for background dispatch (`pool`)

pub mod cipher;
pub mod kdf;
pub mod pool;
pub mod random;

// Re-export the most commonly used items.
pub use cipher::{decrypt, encrypt};
pub use kdf::{derive_key, DerivedKey, KdfProfile, KEY_LEN};
pub use pool::{CryptoPool, JobHandle};
pub use random::{fill_random, generate_salt, NONCE_LEN, SALT_LEN};
