//! Encrypted document containers.
//!
//! This module provides:
//! - The `PDFCRYPT256` binary layout and its metadata (`format`)
//! - Password-driven encryption/decryption composing the crypto layer (`codec`)

pub mod codec;
pub mod format;

// Re-export the most commonly used items.
pub use codec::{
    decrypt_document, decrypt_document_from_bytes, encrypt_document, encrypt_document_to_bytes,
};
pub use format::{ContainerMetadata, EncryptedContainer, CURRENT_VERSION, MAGIC};
