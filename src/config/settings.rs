use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::KdfProfile;
use crate::errors::{Result, SecurityError};
use crate::password::policy::ComplexityPolicy;

/// Policy knobs supplied by the deployment's policy store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityPolicy {
    /// Consecutive denials before a user is locked out (0 disables).
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: u32,

    /// Idle minutes before a session expires.
    #[serde(default = "default_session_timeout_minutes")]
    pub session_timeout_minutes: i64,

    /// Password complexity rules.
    #[serde(default)]
    pub complexity: ComplexityPolicy,
}

/// Engine configuration, loaded from `.docvault.toml`.
///
/// Every field has a sensible default so the engine works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// KDF profile used for new containers and password hashes
    /// ("pbkdf2", "standard", or "enhanced").
    #[serde(default = "default_kdf_profile")]
    pub kdf_profile: String,

    /// Worker threads for background crypto dispatch.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,

    /// Access-control policy knobs.
    #[serde(default)]
    pub policy: SecurityPolicy,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_max_failed_attempts() -> u32 {
    5
}

fn default_session_timeout_minutes() -> i64 {
    30
}

fn default_kdf_profile() -> String {
    "enhanced".to_string()
}

fn default_worker_threads() -> usize {
    2
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: default_max_failed_attempts(),
            session_timeout_minutes: default_session_timeout_minutes(),
            complexity: ComplexityPolicy::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            kdf_profile: default_kdf_profile(),
            worker_threads: default_worker_threads(),
            policy: SecurityPolicy::default(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".docvault.toml";

    /// Load settings from `<project_dir>/.docvault.toml`.
    ///
    /// If the file does not exist, defaults are returned.  If the file
    /// exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            SecurityError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Resolve the configured profile name against the closed profile
    /// set.
    pub fn kdf_profile(&self) -> Result<KdfProfile> {
        KdfProfile::from_tag(&self.kdf_profile).ok_or_else(|| {
            SecurityError::Config(format!("unknown kdf_profile '{}'", self.kdf_profile))
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────
