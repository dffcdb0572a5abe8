//! Password hashing, verification, validation, and generation.

pub mod hasher;
pub mod policy;

// Re-export the most commonly used items.
pub use hasher::{hash_password, verify_password, StoredHash};
pub use policy::{
    generate_secure_password, strength_score, validate_password, ComplexityPolicy,
    PasswordValidation,
};
