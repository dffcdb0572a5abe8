//! Multi-profile password hashing and verification.
//!
//! Hashes encode as `tag:iterations:saltHex:hashHex`.  The tag is
//! parsed once into the closed `KdfProfile` set and matched from there;
//! a malformed tag is rejected outright instead of falling through to
//! some other profile.  The higher profiles apply a SHA-256 pass over
//! the derived bytes, kept for compatibility with their stored format.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::crypto::kdf::{DerivedKey, KdfProfile, KEY_LEN};
use crate::crypto::random::{generate_salt, SALT_LEN};
use crate::errors::{Result, SecurityError};

// ---------------------------------------------------------------------------
// StoredHash
// ---------------------------------------------------------------------------

/// A parsed `tag:iterations:saltHex:hashHex` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredHash {
    pub profile: KdfProfile,
    pub iterations: u32,
    pub salt: Vec<u8>,
    pub digest: Vec<u8>,
}

impl FromStr for StoredHash {
    type Err = SecurityError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 4 {
            return Err(SecurityError::Validation(
                "password hash must have 4 colon-separated fields".into(),
            ));
        }

        let profile = KdfProfile::from_tag(parts[0]).ok_or_else(|| {
            SecurityError::Validation(format!("unknown hash algorithm tag '{}'", parts[0]))
        })?;

        let iterations: u32 = parts[1].parse().map_err(|_| {
            SecurityError::Validation(format!("invalid iteration count '{}'", parts[1]))
        })?;
        if iterations == 0 {
            return Err(SecurityError::Validation(
                "iteration count must be at least 1".into(),
            ));
        }

        let salt = hex::decode(parts[2])
            .map_err(|_| SecurityError::Validation("salt is not valid hex".into()))?;
        if salt.len() != SALT_LEN {
            return Err(SecurityError::Validation(format!(
                "salt must be {SALT_LEN} bytes, got {}",
                salt.len()
            )));
        }

        let digest = hex::decode(parts[3])
            .map_err(|_| SecurityError::Validation("hash is not valid hex".into()))?;
        if digest.len() != KEY_LEN {
            return Err(SecurityError::Validation(format!(
                "hash must be {KEY_LEN} bytes, got {}",
                digest.len()
            )));
        }

        Ok(Self {
            profile,
            iterations,
            salt,
            digest,
        })
    }
}

impl fmt::Display for StoredHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.profile.tag(),
            self.iterations,
            hex::encode(&self.salt),
            hex::encode(&self.digest)
        )
    }
}

// ---------------------------------------------------------------------------
// Hash / verify
// ---------------------------------------------------------------------------

/// Derive the stored digest for `password` under a profile's rules.
fn compute_digest(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    profile: KdfProfile,
) -> Result<Vec<u8>> {
    let derived = DerivedKey::derive(password, salt, iterations)?;
    Ok(if profile.double_hash() {
        Sha256::digest(derived.as_bytes()).to_vec()
    } else {
        derived.as_bytes().to_vec()
    })
}

/// Hash a password under the given profile with a fresh random salt.
pub fn hash_password(password: &str, profile: KdfProfile) -> Result<String> {
    if password.is_empty() {
        return Err(SecurityError::Validation("password cannot be empty".into()));
    }

    let salt = generate_salt()?;
    let digest = compute_digest(password.as_bytes(), &salt, profile.iterations(), profile)?;

    Ok(StoredHash {
        profile,
        iterations: profile.iterations(),
        salt: salt.to_vec(),
        digest,
    }
    .to_string())
}

/// Verify a password against a stored hash string.
///
/// Recomputes using the salt and iteration count embedded in `stored` —
/// never a count supplied from anywhere else — and compares the digests
/// in constant time.  A malformed `stored` string is an error, not a
/// failed match.
pub fn verify_password(password: &str, stored: &str) -> Result<bool> {
    if password.is_empty() {
        return Err(SecurityError::Validation("password cannot be empty".into()));
    }

    let parsed: StoredHash = stored.parse()?;
    let mut candidate = compute_digest(
        password.as_bytes(),
        &parsed.salt,
        parsed.iterations,
        parsed.profile,
    )?;

    let matches: bool = candidate.ct_eq(&parsed.digest).into();
    candidate.zeroize();
    Ok(matches)
}
