//! Integration tests for access-control evaluation, lockout, sessions,
//! and audit logging.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use chrono::{Duration, NaiveTime, TimeZone, Utc, Weekday};

use docvault::access::evaluator::{AccessEvaluator, AclStore};
use docvault::access::{
    AccessControlEntry, AccessDecision, AccessRequest, DenialReason, FailedAttemptTracker,
    Permission, TimeRestrictions,
};
use docvault::audit::{AuditLog, AuditOutcome};
use docvault::config::SecurityPolicy;
use docvault::errors::SecurityError;
use docvault::SecurityEngine;

/// Evaluator with no lockout, plus handles to its stores.
fn evaluator() -> (AccessEvaluator, Arc<AclStore>, Arc<FailedAttemptTracker>, Arc<AuditLog>) {
    let acl = Arc::new(AclStore::new());
    let attempts = Arc::new(FailedAttemptTracker::new());
    let audit = Arc::new(AuditLog::new());
    let eval = AccessEvaluator::new(
        Arc::clone(&acl),
        Arc::clone(&attempts),
        Arc::clone(&audit),
        0,
    );
    (eval, acl, attempts, audit)
}

// ---------------------------------------------------------------------------
// The ordered checks
// ---------------------------------------------------------------------------

#[test]
fn unknown_user_is_not_authorized() {
    let (eval, _acl, _attempts, audit) = evaluator();

    let decision = eval.check_access(&AccessRequest::new("ghost", Permission::Read));
    assert_eq!(decision, AccessDecision::Denied(DenialReason::NotAuthorized));
    assert_eq!(audit.len(), 1);
}

#[test]
fn expired_entry_is_denied() {
    let (eval, acl, _attempts, _audit) = evaluator();

    let mut entry = AccessControlEntry::new("alice", [Permission::Read]);
    entry.expiry_date = Some(Utc::now() - Duration::days(1));
    acl.upsert(entry);

    let decision = eval.check_access(&AccessRequest::new("alice", Permission::Read));
    assert_eq!(decision, AccessDecision::Denied(DenialReason::Expired));
}

#[test]
fn expiry_is_checked_before_permissions() {
    let (eval, acl, _attempts, _audit) = evaluator();

    // Expired AND missing the requested right — expiry wins because the
    // checks short-circuit in order.
    let mut entry = AccessControlEntry::new("alice", [Permission::Read]);
    entry.expiry_date = Some(Utc::now() - Duration::days(1));
    acl.upsert(entry);

    let decision = eval.check_access(&AccessRequest::new("alice", Permission::Edit));
    assert_eq!(decision, AccessDecision::Denied(DenialReason::Expired));
}

#[test]
fn ip_restrictions_deny_unlisted_addresses() {
    let (eval, acl, _attempts, _audit) = evaluator();

    let mut entry = AccessControlEntry::new("alice", [Permission::Read]);
    entry.ip_restrictions = Some(vec!["10.0.0.0/8".to_string(), "192.168.1.5".to_string()]);
    acl.upsert(entry);

    let mut request = AccessRequest::new("alice", Permission::Read);

    request.ip = Some("10.1.2.3".parse().unwrap());
    assert!(eval.check_access(&request).is_allowed());

    request.ip = Some("192.168.1.5".parse().unwrap());
    assert!(eval.check_access(&request).is_allowed());

    request.ip = Some("8.8.8.8".parse().unwrap());
    assert_eq!(
        eval.check_access(&request),
        AccessDecision::Denied(DenialReason::IpNotAllowed)
    );

    // Restrictions present but no address on the request: fail closed.
    request.ip = None;
    assert_eq!(
        eval.check_access(&request),
        AccessDecision::Denied(DenialReason::IpNotAllowed)
    );
}

#[test]
fn time_restrictions_deny_outside_the_window() {
    let (eval, acl, _attempts, _audit) = evaluator();

    let mut entry = AccessControlEntry::new("alice", [Permission::Read]);
    entry.time_restrictions = Some(TimeRestrictions {
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        allowed_weekdays: [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
            .into_iter()
            .collect(),
    });
    acl.upsert(entry);

    let request = AccessRequest::new("alice", Permission::Read);

    // Wednesday inside the window.
    let ok = Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap();
    assert!(eval.check_access_at(&request, ok).is_allowed());

    // Wednesday before the window opens.
    let early = Utc.with_ymd_and_hms(2026, 8, 5, 7, 0, 0).unwrap();
    assert_eq!(
        eval.check_access_at(&request, early),
        AccessDecision::Denied(DenialReason::OutsideAllowedWindow)
    );

    // Saturday, even inside the daily window.
    let weekend = Utc.with_ymd_and_hms(2026, 8, 8, 12, 0, 0).unwrap();
    assert_eq!(
        eval.check_access_at(&request, weekend),
        AccessDecision::Denied(DenialReason::OutsideAllowedWindow)
    );
}

#[test]
fn missing_permission_is_denied_and_audited() {
    let (eval, acl, _attempts, audit) = evaluator();

    // The canonical case: alice holds read+print, asks for edit.
    acl.upsert(AccessControlEntry::new(
        "alice",
        [Permission::Read, Permission::Print],
    ));

    let decision = eval.check_access(&AccessRequest::new("alice", Permission::Edit));
    assert_eq!(
        decision,
        AccessDecision::Denied(DenialReason::MissingPermission)
    );

    let entries = audit.snapshot();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].user_id, "alice");
    assert_eq!(entries[0].action, "access:edit");
    assert_eq!(entries[0].outcome, AuditOutcome::Denied);
    assert_eq!(entries[0].details.as_deref(), Some("missing permission"));
}

#[test]
fn satisfying_every_check_is_allowed() {
    let (eval, acl, attempts, audit) = evaluator();

    acl.upsert(AccessControlEntry::new(
        "alice",
        [Permission::Read, Permission::Print],
    ));

    let decision = eval.check_access(&AccessRequest::new("alice", Permission::Print));
    assert_eq!(decision, AccessDecision::Allowed);

    let entries = audit.snapshot();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].outcome, AuditOutcome::Allowed);
    assert_eq!(entries[0].details, None);
    assert_eq!(attempts.count("alice"), 0);
}

#[test]
fn every_check_appends_exactly_one_audit_entry() {
    let (eval, acl, _attempts, audit) = evaluator();
    acl.upsert(AccessControlEntry::new("alice", [Permission::Read]));

    eval.check_access(&AccessRequest::new("alice", Permission::Read));
    eval.check_access(&AccessRequest::new("alice", Permission::Edit));
    eval.check_access(&AccessRequest::new("ghost", Permission::Read));

    assert_eq!(audit.len(), 3);
}

#[test]
fn denials_increment_the_failure_counter() {
    let (eval, acl, attempts, _audit) = evaluator();
    acl.upsert(AccessControlEntry::new("alice", [Permission::Read]));

    for _ in 0..3 {
        eval.check_access(&AccessRequest::new("alice", Permission::Edit));
    }
    assert_eq!(attempts.count("alice"), 3);

    // An allowed check clears the run of failures.
    eval.check_access(&AccessRequest::new("alice", Permission::Read));
    assert_eq!(attempts.count("alice"), 0);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_denials_never_lose_counter_updates() {
    let acl = Arc::new(AclStore::new());
    let attempts = Arc::new(FailedAttemptTracker::new());
    let audit = Arc::new(AuditLog::new());
    let eval = Arc::new(AccessEvaluator::new(
        Arc::clone(&acl),
        Arc::clone(&attempts),
        Arc::clone(&audit),
        0,
    ));

    acl.upsert(AccessControlEntry::new("alice", [Permission::Read]));

    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let eval = Arc::clone(&eval);
            thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    let decision =
                        eval.check_access(&AccessRequest::new("alice", Permission::Edit));
                    assert_eq!(
                        decision,
                        AccessDecision::Denied(DenialReason::MissingPermission)
                    );
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread");
    }

    let total = (THREADS * PER_THREAD) as u32;
    assert_eq!(attempts.count("alice"), total, "no update may be lost");
    assert_eq!(audit.len(), total as usize, "one audit entry per check");
}

// ---------------------------------------------------------------------------
// Lockout through the engine
// ---------------------------------------------------------------------------

#[test]
fn lockout_engages_after_max_failed_attempts() {
    let policy = SecurityPolicy {
        max_failed_attempts: 3,
        ..SecurityPolicy::default()
    };
    let engine = SecurityEngine::new(policy).expect("engine");

    engine
        .acl()
        .upsert(AccessControlEntry::new("alice", [Permission::Read]));

    // Three denials reach the threshold.
    for _ in 0..3 {
        let decision = engine.check_access(&AccessRequest::new("alice", Permission::Edit));
        assert_eq!(
            decision,
            AccessDecision::Denied(DenialReason::MissingPermission)
        );
    }
    assert!(engine.is_locked_out("alice"));

    // Even a request alice has the right for is now refused.
    let decision = engine.check_access(&AccessRequest::new("alice", Permission::Read));
    assert_eq!(decision, AccessDecision::Denied(DenialReason::Locked));
    assert_eq!(engine.failed_attempts("alice"), 4);

    // Administrative unlock restores access.
    engine.reset_failed_attempts("alice");
    let decision = engine.check_access(&AccessRequest::new("alice", Permission::Read));
    assert_eq!(decision, AccessDecision::Allowed);
}

#[test]
fn require_access_maps_denials_to_policy_denied() {
    let engine = SecurityEngine::new(SecurityPolicy::default()).expect("engine");
    engine
        .acl()
        .upsert(AccessControlEntry::new("alice", [Permission::Read]));

    assert!(engine
        .require_access(&AccessRequest::new("alice", Permission::Read))
        .is_ok());

    let result = engine.require_access(&AccessRequest::new("alice", Permission::Edit));
    assert!(matches!(
        result,
        Err(SecurityError::PolicyDenied(DenialReason::MissingPermission))
    ));
}

// ---------------------------------------------------------------------------
// Engine surface
// ---------------------------------------------------------------------------

#[test]
fn engine_background_encryption_matches_synchronous() {
    let engine = SecurityEngine::new(SecurityPolicy::default()).expect("engine");
    let document = b"background job payload".to_vec();

    let container = engine
        .encrypt_document_background(document.clone(), "pw-123456".to_string())
        .wait()
        .expect("background encrypt");

    let recovered = engine
        .decrypt_document_background(container, "pw-123456".to_string())
        .wait()
        .expect("background decrypt");

    assert_eq!(recovered, document);
}

#[test]
fn engine_sessions_roundtrip() {
    let engine = SecurityEngine::new(SecurityPolicy::default()).expect("engine");

    let session = engine.create_session("alice").expect("session");
    assert!(engine.validate_session(&session.token));
    assert!(engine.revoke_session(&session.token));
    assert!(!engine.validate_session(&session.token));
}

#[test]
fn engine_password_surface_roundtrip() {
    let engine = SecurityEngine::new(SecurityPolicy::default()).expect("engine");

    let generated = engine.generate_secure_password(14).expect("generate");
    let validation = engine.validate_password(&generated);
    assert!(validation.valid, "errors: {:?}", validation.errors);

    let stored = engine.hash_password(&generated).expect("hash");
    assert!(engine.verify_password(&generated, &stored).expect("verify"));
    assert!(!engine.verify_password("different", &stored).expect("verify wrong"));
}

#[test]
fn rights_are_a_set_not_a_hierarchy() {
    let (eval, acl, _attempts, _audit) = evaluator();

    let rights: HashSet<Permission> = [Permission::Edit].into_iter().collect();
    acl.upsert(AccessControlEntry {
        user_id: "bob".to_string(),
        rights,
        expiry_date: None,
        ip_restrictions: None,
        time_restrictions: None,
    });

    // Holding edit does not imply read.
    assert!(eval
        .check_access(&AccessRequest::new("bob", Permission::Edit))
        .is_allowed());
    assert_eq!(
        eval.check_access(&AccessRequest::new("bob", Permission::Read)),
        AccessDecision::Denied(DenialReason::MissingPermission)
    );
}
