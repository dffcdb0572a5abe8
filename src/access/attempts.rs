//! Per-user failed-attempt counters backing the lockout policy.

use std::collections::HashMap;
use std::sync::Mutex;

/// Mutex-guarded failure counters, keyed by user id.
///
/// Incrementing is a read-modify-write cycle done entirely under the
/// lock, so concurrent denials for the same user never lose an update.
#[derive(Debug, Default)]
pub struct FailedAttemptTracker {
    counts: Mutex<HashMap<String, u32>>,
}

impl FailedAttemptTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one failure and return the user's new count.
    pub fn record_failure(&self, user_id: &str) -> u32 {
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        let count = counts.entry(user_id.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Current count for a user (zero if none recorded).
    pub fn count(&self, user_id: &str) -> u32 {
        let counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        counts.get(user_id).copied().unwrap_or(0)
    }

    /// Clear a user's counter.
    pub fn reset(&self, user_id: &str) {
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        counts.remove(user_id);
    }

    /// Whether a user has reached the lockout threshold.  A threshold
    /// of zero disables lockout entirely.
    pub fn is_locked_out(&self, user_id: &str, max_attempts: u32) -> bool {
        max_attempts > 0 && self.count(user_id) >= max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_start_at_zero_and_accumulate() {
        let tracker = FailedAttemptTracker::new();
        assert_eq!(tracker.count("alice"), 0);
        assert_eq!(tracker.record_failure("alice"), 1);
        assert_eq!(tracker.record_failure("alice"), 2);
        assert_eq!(tracker.count("alice"), 2);
        assert_eq!(tracker.count("bob"), 0);
    }

    #[test]
    fn reset_clears_the_counter() {
        let tracker = FailedAttemptTracker::new();
        tracker.record_failure("alice");
        tracker.reset("alice");
        assert_eq!(tracker.count("alice"), 0);
    }

    #[test]
    fn lockout_threshold() {
        let tracker = FailedAttemptTracker::new();
        for _ in 0..3 {
            tracker.record_failure("alice");
        }
        assert!(!tracker.is_locked_out("alice", 4));
        assert!(tracker.is_locked_out("alice", 3));
        // Zero disables lockout.
        assert!(!tracker.is_locked_out("alice", 0));
    }
}
