//! Password complexity rules, strength scoring, and generation.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SecurityError};

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const SPECIAL: &[u8] = b"!@#$%^&*()-_=+[]{};:,.<>?";

// ---------------------------------------------------------------------------
// ComplexityPolicy
// ---------------------------------------------------------------------------

/// Password complexity requirements supplied by the security policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityPolicy {
    /// Minimum password length in characters.
    #[serde(default = "default_min_length")]
    pub min_length: usize,

    #[serde(default = "default_true")]
    pub require_uppercase: bool,

    #[serde(default = "default_true")]
    pub require_lowercase: bool,

    #[serde(default = "default_true")]
    pub require_digit: bool,

    #[serde(default)]
    pub require_special: bool,
}

fn default_min_length() -> usize {
    8
}

fn default_true() -> bool {
    true
}

impl Default for ComplexityPolicy {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Outcome of validating a password against a policy.
#[derive(Debug, Clone)]
pub struct PasswordValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    /// 0–100; length and character variety both contribute.
    pub strength_score: u8,
}

/// Check a password against the policy and score its strength.
///
/// Collects every violation rather than stopping at the first, so the
/// caller can show a complete list.
pub fn validate_password(password: &str, policy: &ComplexityPolicy) -> PasswordValidation {
    let mut errors = Vec::new();

    if password.chars().count() < policy.min_length {
        errors.push(format!(
            "must be at least {} characters",
            policy.min_length
        ));
    }
    if policy.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("must contain an uppercase letter".to_string());
    }
    if policy.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("must contain a lowercase letter".to_string());
    }
    if policy.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("must contain a digit".to_string());
    }
    if policy.require_special && !password.chars().any(is_special) {
        errors.push("must contain a special character".to_string());
    }

    PasswordValidation {
        valid: errors.is_empty(),
        errors,
        strength_score: strength_score(password),
    }
}

fn is_special(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace()
}

/// Score a password 0–100 from length and character-class variety.
pub fn strength_score(password: &str) -> u8 {
    let len = password.chars().count();
    if len == 0 {
        return 0;
    }

    // Up to 40 points for length, capping out at 20 characters.
    let length_points = (len * 2).min(40);

    // 15 points per character class present.
    let mut class_points = 0;
    if password.chars().any(|c| c.is_ascii_uppercase()) {
        class_points += 15;
    }
    if password.chars().any(|c| c.is_ascii_lowercase()) {
        class_points += 15;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        class_points += 15;
    }
    if password.chars().any(is_special) {
        class_points += 15;
    }

    // A password drawn from one or two distinct characters scores low
    // no matter how long it is.
    let distinct = password
        .chars()
        .collect::<std::collections::HashSet<_>>()
        .len();
    let penalty = if distinct <= 2 { 20 } else { 0 };

    (length_points + class_points).saturating_sub(penalty).min(100) as u8
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generate a random password of `length` characters satisfying `policy`.
///
/// One character from every required class is placed first, the rest
/// come from the full pool, and a Fisher–Yates shuffle puts the
/// guaranteed characters at random positions.
pub fn generate_secure_password(length: usize, policy: &ComplexityPolicy) -> Result<String> {
    let mut required: Vec<&[u8]> = Vec::new();
    if policy.require_uppercase {
        required.push(UPPERCASE);
    }
    if policy.require_lowercase {
        required.push(LOWERCASE);
    }
    if policy.require_digit {
        required.push(DIGITS);
    }
    if policy.require_special {
        required.push(SPECIAL);
    }

    if length < policy.min_length || length < required.len() {
        return Err(SecurityError::Validation(format!(
            "password length {length} cannot satisfy the complexity policy"
        )));
    }

    let pool: Vec<u8> = [UPPERCASE, LOWERCASE, DIGITS, SPECIAL].concat();
    let mut rng = rand::rng();

    let mut chars: Vec<u8> = Vec::with_capacity(length);
    for set in &required {
        chars.push(set[rng.random_range(0..set.len())]);
    }
    while chars.len() < length {
        chars.push(pool[rng.random_range(0..pool.len())]);
    }

    for i in (1..chars.len()).rev() {
        let j = rng.random_range(0..=i);
        chars.swap(i, j);
    }

    String::from_utf8(chars)
        .map_err(|_| SecurityError::System("generated password was not valid UTF-8".into()))
}
