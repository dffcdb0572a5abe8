//! Access-control types and policy evaluation.
//!
//! This module provides:
//! - The permission, entry, request, and decision types (here)
//! - IP allow-list rules (`ip`)
//! - The fixed-order policy evaluator and injected ACL store (`evaluator`)
//! - Per-user failed-attempt counters for lockout (`attempts`)
//! - Active-session tracking with idle timeout (`sessions`)

pub mod attempts;
pub mod evaluator;
pub mod ip;
pub mod sessions;

// Re-export the most commonly used items.
pub use attempts::FailedAttemptTracker;
pub use evaluator::{AccessEvaluator, AclStore};
pub use ip::IpRule;
pub use sessions::{Session, SessionStore};

use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Permission
// ---------------------------------------------------------------------------

/// Document rights a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    Read,
    Edit,
    Print,
    Copy,
    Annotate,
    FillForms,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Permission::Read => "read",
            Permission::Edit => "edit",
            Permission::Print => "print",
            Permission::Copy => "copy",
            Permission::Annotate => "annotate",
            Permission::FillForms => "fill-forms",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// TimeRestrictions
// ---------------------------------------------------------------------------

/// A daily time-of-day window plus a weekday allow-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRestrictions {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub allowed_weekdays: HashSet<Weekday>,
}

impl TimeRestrictions {
    /// Whether `now` falls on an allowed weekday inside the daily
    /// window.  Both window ends are inclusive.  A window whose
    /// `start_time` is after its `end_time` wraps past midnight:
    /// 22:00–06:00 covers late evening and early morning.
    pub fn permits(&self, now: DateTime<Utc>) -> bool {
        if !self.allowed_weekdays.contains(&now.weekday()) {
            return false;
        }
        let t = now.time();
        if self.start_time <= self.end_time {
            self.start_time <= t && t <= self.end_time
        } else {
            t >= self.start_time || t <= self.end_time
        }
    }
}

// ---------------------------------------------------------------------------
// AccessControlEntry
// ---------------------------------------------------------------------------

/// One user's rights and restrictions.
///
/// Entries are created and updated by the policy-management layer and
/// are read-only to the engine; the evaluator only ever receives
/// copies out of the [`AclStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessControlEntry {
    pub user_id: String,

    pub rights: HashSet<Permission>,

    /// Access is denied once the current time is past this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,

    /// CIDR ranges or exact addresses, e.g. `"10.0.0.0/8"` or
    /// `"192.168.1.5"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_restrictions: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_restrictions: Option<TimeRestrictions>,
}

impl AccessControlEntry {
    /// Entry with the given rights and no restrictions.
    pub fn new(
        user_id: impl Into<String>,
        rights: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            rights: rights.into_iter().collect(),
            expiry_date: None,
            ip_restrictions: None,
            time_restrictions: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AccessRequest / AccessDecision
// ---------------------------------------------------------------------------

/// A single access attempt.
#[derive(Debug, Clone)]
pub struct AccessRequest {
    pub user_id: String,
    pub permission: Permission,
    pub ip: Option<IpAddr>,
    pub user_agent: Option<String>,
}

impl AccessRequest {
    pub fn new(user_id: impl Into<String>, permission: Permission) -> Self {
        Self {
            user_id: user_id.into(),
            permission,
            ip: None,
            user_agent: None,
        }
    }
}

/// Why an access attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    NotAuthorized,
    Expired,
    IpNotAllowed,
    OutsideAllowedWindow,
    MissingPermission,
    Locked,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            DenialReason::NotAuthorized => "not authorized",
            DenialReason::Expired => "expired",
            DenialReason::IpNotAllowed => "ip not allowed",
            DenialReason::OutsideAllowedWindow => "outside allowed window",
            DenialReason::MissingPermission => "missing permission",
            DenialReason::Locked => "account locked",
        };
        f.write_str(reason)
    }
}

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied(DenialReason),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window(start: (u32, u32), end: (u32, u32)) -> TimeRestrictions {
        TimeRestrictions {
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            allowed_weekdays: [
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ]
            .into_iter()
            .collect(),
        }
    }

    #[test]
    fn window_is_inclusive_at_both_ends() {
        let tr = window((9, 0), (17, 0));
        // 2026-08-05 is a Wednesday.
        let at_start = Utc.with_ymd_and_hms(2026, 8, 5, 9, 0, 0).unwrap();
        let at_end = Utc.with_ymd_and_hms(2026, 8, 5, 17, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2026, 8, 5, 17, 0, 1).unwrap();
        assert!(tr.permits(at_start));
        assert!(tr.permits(at_end));
        assert!(!tr.permits(after));
    }

    #[test]
    fn overnight_window_wraps_past_midnight() {
        let tr = window((22, 0), (6, 0));
        let late = Utc.with_ymd_and_hms(2026, 8, 5, 23, 30, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2026, 8, 5, 5, 0, 0).unwrap();
        let midday = Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap();
        assert!(tr.permits(late));
        assert!(tr.permits(early));
        assert!(!tr.permits(midday));
    }

    #[test]
    fn disallowed_weekday_is_refused() {
        let tr = window((0, 0), (23, 59));
        // 2026-08-08 is a Saturday.
        let saturday = Utc.with_ymd_and_hms(2026, 8, 8, 12, 0, 0).unwrap();
        assert!(!tr.permits(saturday));
    }
}
