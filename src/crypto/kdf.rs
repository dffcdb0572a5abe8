//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! Iteration counts come from a closed set of named profiles.  The same
//! password + salt + iteration count always produces the same key — that
//! determinism is what lets a container be decrypted from its password
//! alone, without the key ever being stored.

use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::errors::{Result, SecurityError};

/// Length of derived keys in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Named derivation profiles.
///
/// The set is closed: a tag found in a stored hash or a config file that
/// is not one of these is rejected up front, never guessed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KdfProfile {
    /// Baseline profile: 100 000 iterations.
    Pbkdf2,
    /// Standard profile: 120 000 iterations, double-hashed.
    Standard,
    /// Enhanced profile: 310 000 iterations (OWASP-minimum grade), double-hashed.
    Enhanced,
}

impl KdfProfile {
    /// Fixed iteration count for this profile.
    pub fn iterations(self) -> u32 {
        match self {
            KdfProfile::Pbkdf2 => 100_000,
            KdfProfile::Standard => 120_000,
            KdfProfile::Enhanced => 310_000,
        }
    }

    /// The tag this profile writes into hash strings.
    pub fn tag(self) -> &'static str {
        match self {
            KdfProfile::Pbkdf2 => "pbkdf2",
            KdfProfile::Standard => "standard",
            KdfProfile::Enhanced => "enhanced",
        }
    }

    /// Look a profile up by its tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "pbkdf2" => Some(KdfProfile::Pbkdf2),
            "standard" => Some(KdfProfile::Standard),
            "enhanced" => Some(KdfProfile::Enhanced),
            _ => None,
        }
    }

    /// Whether the password-hash format applies a SHA-256 pass over the
    /// derived bytes.  Kept for compatibility with the stored format of
    /// the higher profiles.
    pub fn double_hash(self) -> bool {
        !matches!(self, KdfProfile::Pbkdf2)
    }
}

impl Default for KdfProfile {
    fn default() -> Self {
        KdfProfile::Enhanced
    }
}

impl std::fmt::Display for KdfProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Derive a 32-byte key from a password, salt, and iteration count.
///
/// Pure and deterministic.  Attacker-controlled input can never make
/// this fail — the only error paths are empty-password validation and a
/// zero iteration count.
pub fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> Result<[u8; KEY_LEN]> {
    if password.is_empty() {
        return Err(SecurityError::Validation("password cannot be empty".into()));
    }
    if iterations == 0 {
        return Err(SecurityError::KeyDerivation(
            "iteration count must be at least 1".into(),
        ));
    }

    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key);
    Ok(key)
}

/// A derived 32-byte key that zeroes its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Derive a key and wrap it.
    pub fn derive(password: &[u8], salt: &[u8], iterations: u32) -> Result<Self> {
        let mut bytes = derive_key(password, salt, iterations)?;
        let key = Self { bytes };
        bytes.zeroize();
        Ok(key)
    }

    /// Access the raw key bytes (e.g. to hand to the cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}
