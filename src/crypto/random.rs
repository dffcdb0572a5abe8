//! CSPRNG helpers with bounded retry.
//!
//! OS entropy failures are rare and usually transient, so `fill_random`
//! retries a few times with a short backoff before surfacing a fatal
//! `System` error.  There is no fallback to a weaker generator.

use std::thread;
use std::time::Duration;

use rand::TryRngCore;

use crate::errors::{Result, SecurityError};

/// Length of KDF salts in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Length of AES-GCM nonces in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// How many times to ask the OS RNG before giving up.
const MAX_ATTEMPTS: u32 = 3;

/// Backoff before the first retry, doubled each attempt.
const RETRY_BACKOFF: Duration = Duration::from_millis(10);

/// Fill `buf` with cryptographically random bytes.
pub fn fill_random(buf: &mut [u8]) -> Result<()> {
    let mut backoff = RETRY_BACKOFF;
    let mut last_err = String::new();

    for attempt in 0..MAX_ATTEMPTS {
        match rand::rngs::OsRng.try_fill_bytes(buf) {
            Ok(()) => return Ok(()),
            Err(e) => {
                last_err = e.to_string();
                if attempt + 1 < MAX_ATTEMPTS {
                    thread::sleep(backoff);
                    backoff *= 2;
                }
            }
        }
    }

    Err(SecurityError::System(format!(
        "OS random generator failed after {MAX_ATTEMPTS} attempts: {last_err}"
    )))
}

/// Generate a fixed-size array of random bytes.
pub fn random_array<const N: usize>() -> Result<[u8; N]> {
    let mut out = [0u8; N];
    fill_random(&mut out)?;
    Ok(out)
}

/// Generate a random 32-byte KDF salt.
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    random_array()
}

/// Generate a random 12-byte AES-GCM nonce.
pub(crate) fn generate_nonce() -> Result<[u8; NONCE_LEN]> {
    random_array()
}
