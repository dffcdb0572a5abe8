use thiserror::Error;

use crate::access::DenialReason;

/// All errors that can occur in the security engine.
#[derive(Debug, Error)]
pub enum SecurityError {
    // --- Input validation ---
    #[error("Invalid input: {0}")]
    Validation(String),

    // --- Container format ---
    #[error("Invalid container format: {0}")]
    Format(String),

    // --- Crypto ---
    //
    // A wrong password and tampered ciphertext are indistinguishable on
    // purpose; this variant carries no cause detail.
    #[error("Authentication failed — wrong password or tampered data")]
    Authentication,

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("System crypto failure: {0}")]
    System(String),

    // --- Access control ---
    #[error("Access denied: {0}")]
    PolicyDenied(DenialReason),

    // --- Audit ---
    #[error("Audit error: {0}")]
    Audit(String),

    // --- Config ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- IO ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for engine results.
pub type Result<T> = std::result::Result<T, SecurityError>;
