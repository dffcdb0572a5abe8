//! Active-session tracking with an idle timeout.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::crypto::random::random_array;
use crate::errors::Result;

/// An authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque token handed to the caller: 32 random bytes, hex-encoded.
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// Mutex-guarded session map with idle expiry.
#[derive(Debug)]
pub struct SessionStore {
    timeout: Duration,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    /// Store that expires sessions idle for longer than
    /// `timeout_minutes`.
    pub fn new(timeout_minutes: i64) -> Self {
        Self {
            timeout: Duration::minutes(timeout_minutes),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Open a session for a user.
    pub fn create(&self, user_id: &str) -> Result<Session> {
        let token = hex::encode(random_array::<32>()?);
        let now = Utc::now();
        let session = Session {
            token: token.clone(),
            user_id: user_id.to_string(),
            created_at: now,
            last_activity: now,
        };

        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.insert(token, session.clone());
        Ok(session)
    }

    /// Check a token, refreshing its activity timestamp when valid and
    /// removing it when idle past the timeout.
    pub fn validate(&self, token: &str) -> bool {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());

        let expired = match sessions.get_mut(token) {
            Some(session) => {
                if now - session.last_activity <= self.timeout {
                    session.last_activity = now;
                    return true;
                }
                true
            }
            None => false,
        };

        if expired {
            sessions.remove(token);
        }
        false
    }

    /// Remove a session outright.  Returns whether it existed.
    pub fn revoke(&self, token: &str) -> bool {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.remove(token).is_some()
    }

    /// Drop every session idle past the timeout; returns how many were
    /// removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let before = sessions.len();
        let timeout = self.timeout;
        sessions.retain(|_, s| now - s.last_activity <= timeout);
        before - sessions.len()
    }

    pub fn active_count(&self) -> usize {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.len()
    }
}
