//! Binary container format for encrypted documents.
//!
//! A container has this layout:
//!
//! ```text
//! [PDFCRYPT256: 11 bytes][metadata_len: u32 LE][metadata JSON][ciphertext + tag]
//! ```
//!
//! - **Magic** (`PDFCRYPT256`): identifies the blob as an encrypted
//!   document container.
//! - **Metadata length**: little-endian u32 telling us where the
//!   metadata JSON ends and the ciphertext begins.
//! - **Metadata JSON**: serialized `ContainerMetadata` — everything a
//!   decoder needs to re-derive the key from a password.
//! - **Ciphertext**: the AES-GCM output, 16-byte authentication tag
//!   included.
//!
//! Deserialization checks the magic first and bounds-checks the length
//! field against the remaining buffer before slicing anything.  A
//! container that fails any of these checks is rejected without the
//! ciphertext ever being touched.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::crypto::random::{NONCE_LEN, SALT_LEN};
use crate::errors::{Result, SecurityError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes at the start of every container.
pub const MAGIC: &[u8; 11] = b"PDFCRYPT256";

/// Current container format version.
pub const CURRENT_VERSION: u8 = 1;

/// The only cipher this format carries.
pub const ALGORITHM_AES_256_GCM: &str = "AES-256-GCM";

/// Minimum plausible ciphertext: the bare authentication tag.
const MIN_CIPHERTEXT_LEN: usize = 16;

/// Fixed-size prefix: 11 (magic) + 4 (metadata_len).
const PREFIX_LEN: usize = MAGIC.len() + 4;

// ---------------------------------------------------------------------------
// ContainerMetadata
// ---------------------------------------------------------------------------

/// Metadata stored as UTF-8 JSON between the length field and the
/// ciphertext.  Byte fields serialize as base64 strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerMetadata {
    /// Format version.
    pub version: u8,

    /// Cipher name.  Decoders reject anything but `AES-256-GCM` rather
    /// than guessing.
    pub algorithm: String,

    /// PBKDF2 iteration count used when the container was written.
    pub iterations: u32,

    /// The salt used for key derivation (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// The AES-GCM nonce (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub iv: Vec<u8>,
}

impl ContainerMetadata {
    /// Check every invariant a decoder relies on before any ciphertext
    /// is considered.
    pub fn validate(&self) -> Result<()> {
        if self.algorithm != ALGORITHM_AES_256_GCM {
            return Err(SecurityError::Format(format!(
                "unknown algorithm '{}'",
                self.algorithm
            )));
        }
        if self.salt.len() != SALT_LEN {
            return Err(SecurityError::Format(format!(
                "salt must be {SALT_LEN} bytes, got {}",
                self.salt.len()
            )));
        }
        if self.iv.len() != NONCE_LEN {
            return Err(SecurityError::Format(format!(
                "iv must be {NONCE_LEN} bytes, got {}",
                self.iv.len()
            )));
        }
        if self.iterations == 0 {
            return Err(SecurityError::Format(
                "iteration count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EncryptedContainer
// ---------------------------------------------------------------------------

/// An encrypted document container: parsed metadata plus the raw
/// ciphertext (authentication tag included).
///
/// A pure value type — fully owned by whoever holds it, with no
/// back-references into the engine.
#[derive(Debug, Clone)]
pub struct EncryptedContainer {
    pub metadata: ContainerMetadata,
    pub ciphertext: Vec<u8>,
}

impl EncryptedContainer {
    /// Lay this container out as bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serialize(&self.metadata, &self.ciphertext)
    }

    /// Parse a container from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        deserialize(data)
    }
}

// ---------------------------------------------------------------------------
// Serialize / deserialize
// ---------------------------------------------------------------------------

/// Lay out a container: magic ‖ metadata length ‖ metadata JSON ‖ ciphertext.
pub fn serialize(metadata: &ContainerMetadata, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let metadata_bytes = serde_json::to_vec(metadata)
        .map_err(|e| SecurityError::Serialization(format!("metadata: {e}")))?;

    let metadata_len = u32::try_from(metadata_bytes.len()).map_err(|_| {
        SecurityError::Serialization(format!(
            "metadata length {} exceeds u32::MAX",
            metadata_bytes.len()
        ))
    })?;

    let mut buf = Vec::with_capacity(PREFIX_LEN + metadata_bytes.len() + ciphertext.len());
    buf.extend_from_slice(MAGIC); // 11 bytes
    buf.extend_from_slice(&metadata_len.to_le_bytes()); // 4 bytes LE
    buf.extend_from_slice(&metadata_bytes); // metadata JSON
    buf.extend_from_slice(ciphertext); // ciphertext + tag
    Ok(buf)
}

/// Parse container bytes back into metadata and ciphertext.
///
/// Malformed containers never partially decrypt: the magic, the length
/// bounds, and the metadata must all check out before the ciphertext is
/// even sliced.
pub fn deserialize(data: &[u8]) -> Result<EncryptedContainer> {
    if data.len() < PREFIX_LEN {
        return Err(SecurityError::Format(
            "buffer too small to be a container".into(),
        ));
    }

    if &data[..MAGIC.len()] != MAGIC {
        return Err(SecurityError::Format("missing PDFCRYPT256 magic".into()));
    }

    let metadata_len_u32 = u32::from_le_bytes(
        data[MAGIC.len()..PREFIX_LEN]
            .try_into()
            .map_err(|_| SecurityError::Format("bad metadata length field".into()))?,
    );
    let metadata_len = usize::try_from(metadata_len_u32).map_err(|_| {
        SecurityError::Format(format!(
            "metadata length {metadata_len_u32} exceeds platform address space"
        ))
    })?;

    let metadata_end = PREFIX_LEN
        .checked_add(metadata_len)
        .ok_or_else(|| SecurityError::Format("metadata length overflows".into()))?;
    if metadata_end > data.len() {
        return Err(SecurityError::Format(
            "metadata length exceeds buffer size".into(),
        ));
    }

    let metadata: ContainerMetadata = serde_json::from_slice(&data[PREFIX_LEN..metadata_end])
        .map_err(|e| SecurityError::Format(format!("metadata JSON: {e}")))?;
    metadata.validate()?;

    let ciphertext = &data[metadata_end..];
    if ciphertext.len() < MIN_CIPHERTEXT_LEN {
        return Err(SecurityError::Format(
            "ciphertext shorter than the authentication tag".into(),
        ));
    }

    Ok(EncryptedContainer {
        metadata,
        ciphertext: ciphertext.to_vec(),
    })
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&BASE64.encode(data))
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> ContainerMetadata {
        ContainerMetadata {
            version: CURRENT_VERSION,
            algorithm: ALGORITHM_AES_256_GCM.to_string(),
            iterations: 100_000,
            salt: vec![0x42; SALT_LEN],
            iv: vec![0x24; NONCE_LEN],
        }
    }

    #[test]
    fn serialize_deserialize_roundtrip() {
        let ciphertext = vec![0xABu8; 48];
        let bytes = serialize(&sample_metadata(), &ciphertext).expect("serialize");

        let parsed = deserialize(&bytes).expect("deserialize");
        assert_eq!(parsed.metadata.algorithm, ALGORITHM_AES_256_GCM);
        assert_eq!(parsed.metadata.iterations, 100_000);
        assert_eq!(parsed.metadata.salt, vec![0x42; SALT_LEN]);
        assert_eq!(parsed.ciphertext, ciphertext);
    }

    #[test]
    fn layout_starts_with_magic_and_le_length() {
        let bytes = serialize(&sample_metadata(), &[0u8; 16]).expect("serialize");
        assert_eq!(&bytes[..11], MAGIC);

        let len = u32::from_le_bytes(bytes[11..15].try_into().unwrap()) as usize;
        // The declared length covers exactly the JSON between prefix and ciphertext.
        assert_eq!(15 + len + 16, bytes.len());
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut bytes = serialize(&sample_metadata(), &[0u8; 16]).expect("serialize");
        bytes[0] = b'X';
        assert!(deserialize(&bytes).is_err());
    }

    #[test]
    fn oversized_length_field_is_rejected() {
        let mut bytes = serialize(&sample_metadata(), &[0u8; 16]).expect("serialize");
        bytes[11..15].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(deserialize(&bytes).is_err());
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        let bytes = serialize(&sample_metadata(), &[0u8; 16]).expect("serialize");
        assert!(deserialize(&bytes[..10]).is_err());
        assert!(deserialize(&bytes[..bytes.len() - 20]).is_err());
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let mut metadata = sample_metadata();
        metadata.algorithm = "RC4".to_string();
        let bytes = serialize(&metadata, &[0u8; 16]).expect("serialize");
        assert!(deserialize(&bytes).is_err());
    }

    #[test]
    fn bad_salt_length_is_rejected() {
        let mut metadata = sample_metadata();
        metadata.salt = vec![0u8; 8];
        let bytes = serialize(&metadata, &[0u8; 16]).expect("serialize");
        assert!(deserialize(&bytes).is_err());
    }
}
