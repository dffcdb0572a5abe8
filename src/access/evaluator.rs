//! Fixed-order access policy evaluation.
//!
//! Checks run in a fixed order and stop at the first failure: entry
//! exists, expiry, IP restrictions, time restrictions, then the
//! requested permission.  Every invocation — allowed or denied —
//! appends exactly one audit entry; every denial bumps the user's
//! failed-attempt counter.  A user already at the lockout threshold is
//! denied before the checks run.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::access::ip::IpRule;
use crate::access::{
    AccessControlEntry, AccessDecision, AccessRequest, DenialReason, FailedAttemptTracker,
};
use crate::audit::{AuditLog, AuditLogEntry, AuditOutcome};

// ---------------------------------------------------------------------------
// AclStore
// ---------------------------------------------------------------------------

/// Injected store of access-control entries.
///
/// The policy-management layer writes entries through `upsert` and
/// `remove`; the evaluator only reads.  An explicitly constructed store
/// object — never process-global state — so sessions and tests stay
/// isolated from each other.
#[derive(Debug, Default)]
pub struct AclStore {
    entries: Mutex<HashMap<String, AccessControlEntry>>,
}

impl AclStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `entry.user_id`.
    pub fn upsert(&self, entry: AccessControlEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(entry.user_id.clone(), entry);
    }

    /// Remove a user's entry.  Returns whether one existed.
    pub fn remove(&self, user_id: &str) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(user_id).is_some()
    }

    /// Copy of a user's entry, if present.
    pub fn get(&self, user_id: &str) -> Option<AccessControlEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(user_id).cloned()
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// AccessEvaluator
// ---------------------------------------------------------------------------

/// Evaluates access requests against the injected stores.
pub struct AccessEvaluator {
    acl: Arc<AclStore>,
    attempts: Arc<FailedAttemptTracker>,
    audit: Arc<AuditLog>,
    /// Consecutive failures before a user is locked out (0 disables).
    lockout_threshold: u32,
}

impl AccessEvaluator {
    pub fn new(
        acl: Arc<AclStore>,
        attempts: Arc<FailedAttemptTracker>,
        audit: Arc<AuditLog>,
        lockout_threshold: u32,
    ) -> Self {
        Self {
            acl,
            attempts,
            audit,
            lockout_threshold,
        }
    }

    /// Evaluate a request at the current instant.
    pub fn check_access(&self, request: &AccessRequest) -> AccessDecision {
        self.check_access_at(request, Utc::now())
    }

    /// Evaluate a request at an explicit instant.  Tests pin the clock
    /// this way; `check_access` is the production entry point.
    pub fn check_access_at(&self, request: &AccessRequest, now: DateTime<Utc>) -> AccessDecision {
        let decision = if self
            .attempts
            .is_locked_out(&request.user_id, self.lockout_threshold)
        {
            AccessDecision::Denied(DenialReason::Locked)
        } else {
            evaluate(self.acl.get(&request.user_id).as_ref(), request, now)
        };

        self.record(request, &decision, now);
        decision
    }

    /// Append the audit entry for a decision; denials also bump the
    /// failure counter, allowed decisions clear it.
    fn record(&self, request: &AccessRequest, decision: &AccessDecision, now: DateTime<Utc>) {
        let (outcome, details) = match decision {
            AccessDecision::Allowed => (AuditOutcome::Allowed, None),
            AccessDecision::Denied(reason) => (AuditOutcome::Denied, Some(reason.to_string())),
        };

        self.audit.append(AuditLogEntry {
            timestamp: now,
            user_id: request.user_id.clone(),
            action: format!("access:{}", request.permission),
            outcome,
            details,
            ip_address: request.ip.map(|ip| ip.to_string()),
            user_agent: request.user_agent.clone(),
        });

        match decision {
            AccessDecision::Denied(reason) => {
                let failures = self.attempts.record_failure(&request.user_id);
                tracing::debug!(user = %request.user_id, %reason, failures, "access denied");
            }
            AccessDecision::Allowed => self.attempts.reset(&request.user_id),
        }
    }
}

// ---------------------------------------------------------------------------
// The ordered checks
// ---------------------------------------------------------------------------

/// The policy checks themselves, free of any shared state.
fn evaluate(
    entry: Option<&AccessControlEntry>,
    request: &AccessRequest,
    now: DateTime<Utc>,
) -> AccessDecision {
    let Some(entry) = entry else {
        return AccessDecision::Denied(DenialReason::NotAuthorized);
    };

    if let Some(expiry) = entry.expiry_date {
        if now > expiry {
            return AccessDecision::Denied(DenialReason::Expired);
        }
    }

    if let Some(rules) = entry.ip_restrictions.as_deref().filter(|r| !r.is_empty()) {
        if !ip_permitted(rules, request.ip) {
            return AccessDecision::Denied(DenialReason::IpNotAllowed);
        }
    }

    if let Some(windows) = &entry.time_restrictions {
        if !windows.permits(now) {
            return AccessDecision::Denied(DenialReason::OutsideAllowedWindow);
        }
    }

    if !entry.rights.contains(&request.permission) {
        return AccessDecision::Denied(DenialReason::MissingPermission);
    }

    AccessDecision::Allowed
}

/// A request passes an IP restriction when its address matches any
/// rule.  No address on the request, or a rule that fails to parse,
/// never passes.
fn ip_permitted(rules: &[String], ip: Option<IpAddr>) -> bool {
    let Some(ip) = ip else {
        return false;
    };

    rules.iter().any(|raw| match raw.parse::<IpRule>() {
        Ok(rule) => rule.matches(ip),
        Err(_) => {
            tracing::warn!(rule = %raw, "ignoring unparseable IP restriction");
            false
        }
    })
}
