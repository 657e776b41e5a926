// event.rs: Audit event data model.
//
// One AuditEvent is one line in the ledger. Events are immutable once
// appended; the ledger never rewrites or deletes a line.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome recorded for an attempted action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    /// The action ran and succeeded.
    Ok,
    /// Policy refused the action before it ran.
    Denied,
    /// The action was permitted but failed, or was not registered.
    Error,
    /// Intent recorded ahead of an external call (planner requests).
    Request,
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditStatus::Ok => "ok",
            AuditStatus::Denied => "denied",
            AuditStatus::Error => "error",
            AuditStatus::Request => "request",
        };
        f.write_str(s)
    }
}

/// A single audit record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditEvent {
    /// When the event was appended (UTC). Re-stamped by the ledger.
    pub timestamp: DateTime<Utc>,

    /// What was attempted: a capability name, or "planner", "dashboard".
    pub action: String,

    pub status: AuditStatus,

    /// Human-readable detail. Redacted before it is written.
    #[serde(default)]
    pub detail: String,

    /// Files the action read or wrote, in the order it reported them.
    #[serde(default)]
    pub touched_files: Vec<String>,

    /// SHA-256 of the previous raw ledger line. `None` for the first record.
    #[serde(default)]
    pub previous_hash: Option<String>,
}

impl AuditEvent {
    pub fn new(action: impl Into<String>, status: AuditStatus) -> Self {
        Self {
            timestamp: Utc::now(),
            action: action.into(),
            status,
            detail: String::new(),
            touched_files: Vec::new(),
            previous_hash: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn with_touched_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.touched_files = files
            .into_iter()
            .map(|p| p.as_ref().to_string_lossy().into_owned())
            .collect();
        self
    }
}
