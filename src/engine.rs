//! The engine facade: one handle wiring crypto, containers, passwords,
//! access control, sessions, and the audit log together.
//!
//! All shared state (the ACL store, failure counters, session store,
//! and audit log) is constructed here and injected into the evaluator —
//! nothing in the crate is process-global.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::access::evaluator::{AccessEvaluator, AclStore};
use crate::access::sessions::{Session, SessionStore};
use crate::access::{AccessDecision, AccessRequest, FailedAttemptTracker};
use crate::audit::{AuditLog, AuditLogEntry};
use crate::config::{SecurityPolicy, Settings};
use crate::container::codec;
use crate::container::format::EncryptedContainer;
use crate::crypto::kdf::KdfProfile;
use crate::crypto::pool::{CryptoPool, JobHandle};
use crate::errors::{Result, SecurityError};
use crate::password::{hasher, policy};
use crate::password::policy::PasswordValidation;

/// Document security engine.
///
/// Encryption and hashing are stateless and delegate straight to the
/// crypto layer; access checks run against the injected stores and are
/// always audited.
pub struct SecurityEngine {
    policy: SecurityPolicy,
    profile: KdfProfile,
    acl: Arc<AclStore>,
    attempts: Arc<FailedAttemptTracker>,
    sessions: SessionStore,
    audit: Arc<AuditLog>,
    evaluator: AccessEvaluator,
    pool: CryptoPool,
}

impl SecurityEngine {
    /// Engine with the given policy and defaults everywhere else.
    pub fn new(policy: SecurityPolicy) -> Result<Self> {
        Self::build(policy, KdfProfile::default(), 2, Arc::new(AuditLog::new()))
    }

    /// Engine configured from `Settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::build(
            settings.policy.clone(),
            settings.kdf_profile()?,
            settings.worker_threads,
            Arc::new(AuditLog::new()),
        )
    }

    /// Engine whose audit log also persists to `<dir>/audit.db`.
    #[cfg(feature = "audit-db")]
    pub fn with_audit_database(policy: SecurityPolicy, dir: &std::path::Path) -> Result<Self> {
        Self::build(
            policy,
            KdfProfile::default(),
            2,
            Arc::new(AuditLog::with_database(dir)),
        )
    }

    fn build(
        policy: SecurityPolicy,
        profile: KdfProfile,
        worker_threads: usize,
        audit: Arc<AuditLog>,
    ) -> Result<Self> {
        let acl = Arc::new(AclStore::new());
        let attempts = Arc::new(FailedAttemptTracker::new());
        let sessions = SessionStore::new(policy.session_timeout_minutes);
        let evaluator = AccessEvaluator::new(
            Arc::clone(&acl),
            Arc::clone(&attempts),
            Arc::clone(&audit),
            policy.max_failed_attempts,
        );
        let pool = CryptoPool::new(worker_threads)?;

        Ok(Self {
            policy,
            profile,
            acl,
            attempts,
            sessions,
            audit,
            evaluator,
            pool,
        })
    }

    // ------------------------------------------------------------------
    // Document encryption
    // ------------------------------------------------------------------

    /// Encrypt a document blob under a password.
    pub fn encrypt_document(&self, document: &[u8], password: &str) -> Result<EncryptedContainer> {
        codec::encrypt_document(document, password.as_bytes(), self.profile)
    }

    /// Decrypt a container back into the original document bytes.
    pub fn decrypt_document(
        &self,
        container: &EncryptedContainer,
        password: &str,
    ) -> Result<Vec<u8>> {
        codec::decrypt_document(container, password.as_bytes())
    }

    /// Encrypt on the worker pool so a high-iteration derivation never
    /// blocks the calling thread.  `wait()` on the handle for the
    /// result.
    pub fn encrypt_document_background(
        &self,
        document: Vec<u8>,
        password: String,
    ) -> JobHandle<EncryptedContainer> {
        let profile = self.profile;
        self.pool
            .execute(move || codec::encrypt_document(&document, password.as_bytes(), profile))
    }

    /// Decrypt on the worker pool.
    pub fn decrypt_document_background(
        &self,
        container: EncryptedContainer,
        password: String,
    ) -> JobHandle<Vec<u8>> {
        self.pool
            .execute(move || codec::decrypt_document(&container, password.as_bytes()))
    }

    // ------------------------------------------------------------------
    // Passwords
    // ------------------------------------------------------------------

    /// Hash a password under the engine's KDF profile.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        hasher::hash_password(password, self.profile)
    }

    /// Verify a password against a stored hash string.
    pub fn verify_password(&self, password: &str, stored: &str) -> Result<bool> {
        hasher::verify_password(password, stored)
    }

    /// Check a password against the policy's complexity rules.
    pub fn validate_password(&self, password: &str) -> PasswordValidation {
        policy::validate_password(password, &self.policy.complexity)
    }

    /// Generate a random password satisfying the policy's complexity
    /// rules.
    pub fn generate_secure_password(&self, length: usize) -> Result<String> {
        policy::generate_secure_password(length, &self.policy.complexity)
    }

    // ------------------------------------------------------------------
    // Access control
    // ------------------------------------------------------------------

    /// Run the ordered policy checks for one access attempt.
    ///
    /// Exactly one audit entry is appended per call.  A user at the
    /// lockout threshold is denied before the checks run.
    pub fn check_access(&self, request: &AccessRequest) -> AccessDecision {
        self.evaluator.check_access(request)
    }

    /// Like `check_access` with an explicit clock, for callers that
    /// need reproducible evaluation.
    pub fn check_access_at(&self, request: &AccessRequest, now: DateTime<Utc>) -> AccessDecision {
        self.evaluator.check_access_at(request, now)
    }

    /// Like `check_access`, but a denial comes back through the error
    /// channel as `PolicyDenied`.
    pub fn require_access(&self, request: &AccessRequest) -> Result<()> {
        match self.check_access(request) {
            AccessDecision::Allowed => Ok(()),
            AccessDecision::Denied(reason) => Err(SecurityError::PolicyDenied(reason)),
        }
    }

    /// The injected ACL store.  The policy-management layer writes
    /// entries through this; the engine itself only reads them.
    pub fn acl(&self) -> &AclStore {
        &self.acl
    }

    /// Current failed-attempt count for a user.
    pub fn failed_attempts(&self, user_id: &str) -> u32 {
        self.attempts.count(user_id)
    }

    /// Whether a user has hit the lockout threshold.
    pub fn is_locked_out(&self, user_id: &str) -> bool {
        self.attempts
            .is_locked_out(user_id, self.policy.max_failed_attempts)
    }

    /// Administrative unlock: clear a user's failure counter.
    pub fn reset_failed_attempts(&self, user_id: &str) {
        self.attempts.reset(user_id)
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    pub fn create_session(&self, user_id: &str) -> Result<Session> {
        self.sessions.create(user_id)
    }

    pub fn validate_session(&self, token: &str) -> bool {
        self.sessions.validate(token)
    }

    pub fn revoke_session(&self, token: &str) -> bool {
        self.sessions.revoke(token)
    }

    pub fn purge_expired_sessions(&self) -> usize {
        self.sessions.purge_expired()
    }

    // ------------------------------------------------------------------
    // Audit
    // ------------------------------------------------------------------

    /// Append a caller-supplied entry to the audit log.
    pub fn append_audit_entry(&self, entry: AuditLogEntry) {
        self.audit.append(entry)
    }

    /// The audit log itself, for queries and snapshots.
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    pub fn kdf_profile(&self) -> KdfProfile {
        self.profile
    }
}
