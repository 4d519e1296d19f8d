//! Append-only audit log.
//!
//! Entries are stored oldest-first. [`AuditLog::latest`] gives the
//! newest-first view the interactive front end shows.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::phase::Phase;

/// One audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditLogEntry {
    /// Wall-clock time the entry was recorded
    pub timestamp: DateTime<Utc>,
    /// Phase active when the entry was recorded
    pub phase: Phase,
    /// Human-readable description
    pub message: String,
}

impl std::fmt::Display for AuditLogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {:<15} {}",
            self.timestamp.format("%H:%M:%S"),
            self.phase,
            self.message
        )
    }
}

/// Ordered, append-only sequence of [`AuditLogEntry`].
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Vec<AuditLogEntry>,
}

impl AuditLog {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends an entry stamped with the current time and returns a copy.
    pub fn record(&mut self, phase: Phase, message: impl Into<String>) -> AuditLogEntry {
        let entry = AuditLogEntry {
            timestamp: Utc::now(),
            phase,
            message: message.into(),
        };
        self.entries.push(entry.clone());
        entry
    }

    /// Number of entries recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read-only snapshot, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.clone()
    }

    /// Up to `n` most recent entries, newest first.
    #[must_use]
    pub fn latest(&self, n: usize) -> Vec<AuditLogEntry> {
        self.entries.iter().rev().take(n).cloned().collect()
    }
}
