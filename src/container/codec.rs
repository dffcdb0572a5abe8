//! Password-driven document encryption over the container format.
//!
//! `encrypt_document` composes salt generation, PBKDF2, and AES-GCM
//! into a self-describing container; `decrypt_document` reverses it
//! using only the password and what the container itself carries.

use crate::container::format::{
    ContainerMetadata, EncryptedContainer, ALGORITHM_AES_256_GCM, CURRENT_VERSION, MAGIC,
};
use crate::crypto::cipher;
use crate::crypto::kdf::{DerivedKey, KdfProfile};
use crate::crypto::random::generate_salt;
use crate::errors::{Result, SecurityError};

/// Encrypt a document blob under a password.
///
/// A fresh salt and nonce are generated on every call, so encrypting
/// the same document twice yields different containers that both
/// decrypt.  The container magic is the associated data, binding the
/// ciphertext to this format.
pub fn encrypt_document(
    plaintext: &[u8],
    password: &[u8],
    profile: KdfProfile,
) -> Result<EncryptedContainer> {
    if plaintext.is_empty() {
        return Err(SecurityError::Validation("document is empty".into()));
    }
    if password.is_empty() {
        return Err(SecurityError::Validation("password cannot be empty".into()));
    }

    let salt = generate_salt()?;
    let iterations = profile.iterations();

    let key = DerivedKey::derive(password, &salt, iterations)?;
    let (iv, ciphertext) = cipher::encrypt(key.as_bytes(), plaintext, MAGIC)?;

    tracing::debug!(bytes = plaintext.len(), iterations, "encrypted document");

    Ok(EncryptedContainer {
        metadata: ContainerMetadata {
            version: CURRENT_VERSION,
            algorithm: ALGORITHM_AES_256_GCM.to_string(),
            iterations,
            salt: salt.to_vec(),
            iv: iv.to_vec(),
        },
        ciphertext,
    })
}

/// Decrypt a container back into the original document bytes.
///
/// The key is re-derived from the password and the container's own
/// embedded salt and iteration count — never from anything the caller
/// supplies beside the password.  A wrong password and a tampered
/// container are indistinguishable: both surface as `Authentication`.
pub fn decrypt_document(container: &EncryptedContainer, password: &[u8]) -> Result<Vec<u8>> {
    if password.is_empty() {
        return Err(SecurityError::Validation("password cannot be empty".into()));
    }
    container.metadata.validate()?;

    let key = DerivedKey::derive(
        password,
        &container.metadata.salt,
        container.metadata.iterations,
    )?;
    cipher::decrypt(
        key.as_bytes(),
        &container.metadata.iv,
        &container.ciphertext,
        MAGIC,
    )
}

/// Encrypt straight to container bytes.
pub fn encrypt_document_to_bytes(
    plaintext: &[u8],
    password: &[u8],
    profile: KdfProfile,
) -> Result<Vec<u8>> {
    encrypt_document(plaintext, password, profile)?.to_bytes()
}

/// Parse container bytes and decrypt them.
pub fn decrypt_document_from_bytes(data: &[u8], password: &[u8]) -> Result<Vec<u8>> {
    let container = EncryptedContainer::from_bytes(data)?;
    decrypt_document(&container, password)
}
