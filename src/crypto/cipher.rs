//! AES-256-GCM authenticated encryption.
//!
//! `encrypt` generates a fresh random 12-byte nonce on every call and
//! returns it beside the tagged ciphertext; callers never supply a nonce
//! for a new encryption, so a nonce cannot repeat under the same key by
//! caller mistake.  The associated data is authenticated but not
//! encrypted — decryption fails if it differs.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};

use crate::crypto::random::{generate_nonce, NONCE_LEN};
use crate::errors::{Result, SecurityError};

/// Length of the GCM authentication tag in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` with a 32-byte `key`, authenticating `aad`.
///
/// Returns the freshly generated nonce and the ciphertext with the
/// 16-byte authentication tag appended.
pub fn encrypt(key: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<([u8; NONCE_LEN], Vec<u8>)> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| SecurityError::System(format!("invalid key length: {e}")))?;

    let nonce_bytes = generate_nonce()?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, Payload { msg: plaintext, aad })
        .map_err(|e| SecurityError::System(format!("encryption error: {e}")))?;

    Ok((nonce_bytes, ciphertext))
}

/// Decrypt data produced by `encrypt`.
///
/// A single bit flip anywhere in the ciphertext, tag, nonce, or aad
/// makes this fail closed with `Authentication` — no partial output.
pub fn decrypt(key: &[u8], nonce: &[u8], ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    if nonce.len() != NONCE_LEN || ciphertext.len() < TAG_LEN {
        return Err(SecurityError::Authentication);
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| SecurityError::Authentication)?;
    let nonce = Nonce::from_slice(nonce);

    cipher
        .decrypt(nonce, Payload { msg: ciphertext, aad })
        .map_err(|_| SecurityError::Authentication)
}
