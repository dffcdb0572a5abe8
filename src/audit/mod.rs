//! Append-only audit log of access attempts and security operations.
//!
//! Entries land in an in-memory log guarded by a single lock, so
//! concurrent appends serialize and none are lost or interleaved.  Once
//! written an entry is never mutated or deleted; callers only ever
//! receive copies.
//!
//! With the `audit-db` feature (default) entries are also persisted to
//! a SQLite database.  Designed for graceful degradation: if the
//! database can't be opened or written to, the in-memory log keeps
//! working and persistence is silently absent.

use std::fmt;
#[cfg(feature = "audit-db")]
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
#[cfg(feature = "audit-db")]
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// Outcome recorded for an audited attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Allowed,
    Denied,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Allowed => f.write_str("allowed"),
            AuditOutcome::Denied => f.write_str("denied"),
        }
    }
}

/// A single audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub action: String,
    pub outcome: AuditOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// The append-only log.
pub struct AuditLog {
    entries: Mutex<Vec<AuditLogEntry>>,
    #[cfg(feature = "audit-db")]
    db: Mutex<Option<Connection>>,
}

impl AuditLog {
    /// In-memory log with no persistence.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            #[cfg(feature = "audit-db")]
            db: Mutex::new(None),
        }
    }

    /// Log that also persists entries to `<dir>/audit.db`.
    ///
    /// If the database can't be opened the log still works in memory,
    /// the same as having no database at all.
    #[cfg(feature = "audit-db")]
    pub fn with_database(dir: &Path) -> Self {
        let log = Self::new();
        if let Some(conn) = open_database(dir) {
            *log.db.lock().unwrap_or_else(|e| e.into_inner()) = Some(conn);
        }
        log
    }

    /// Append an entry.  The in-memory append always succeeds; the
    /// database insert is fire-and-forget.
    pub fn append(&self, entry: AuditLogEntry) {
        #[cfg(feature = "audit-db")]
        self.persist(&entry);

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push(entry);
    }

    /// Number of entries recorded so far.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every entry, oldest first.
    pub fn snapshot(&self) -> Vec<AuditLogEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clone()
    }

    /// Recent entries, most recent first.
    ///
    /// - `limit`: maximum number of entries to return.
    /// - `since`: if provided, only entries at or after this timestamp.
    pub fn query(&self, limit: usize, since: Option<DateTime<Utc>>) -> Vec<AuditLogEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .rev()
            .filter(|e| since.map_or(true, |ts| e.timestamp >= ts))
            .take(limit)
            .cloned()
            .collect()
    }

    #[cfg(feature = "audit-db")]
    fn persist(&self, entry: &AuditLogEntry) {
        let db = self.db.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(conn) = db.as_ref() {
            let _ = conn.execute(
                "INSERT INTO audit_log (timestamp, user_id, action, outcome, details, ip_address, user_agent)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    entry.timestamp.to_rfc3339(),
                    entry.user_id,
                    entry.action,
                    entry.outcome.to_string(),
                    entry.details,
                    entry.ip_address,
                    entry.user_agent,
                ],
            );
        }
    }

    /// Return the path of the audit database inside `dir`.
    #[cfg(feature = "audit-db")]
    pub fn db_path(dir: &Path) -> PathBuf {
        dir.join("audit.db")
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Open (or create) the audit database, returning `None` when anything
/// goes wrong so callers degrade to memory-only logging.
#[cfg(feature = "audit-db")]
fn open_database(dir: &Path) -> Option<Connection> {
    let db_path = dir.join("audit.db");
    let conn = Connection::open(&db_path).ok()?;

    // Restrict the audit database to its owner.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        let _ = std::fs::set_permissions(&db_path, perms);
    }

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS audit_log (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp  TEXT NOT NULL,
            user_id    TEXT NOT NULL,
            action     TEXT NOT NULL,
            outcome    TEXT NOT NULL,
            details    TEXT,
            ip_address TEXT,
            user_agent TEXT
        );",
    )
    .ok()?;

    Some(conn)
}
