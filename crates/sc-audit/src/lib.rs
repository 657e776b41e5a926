//! # sc-audit
//!
//! Append-only audit ledger and secret redaction for SafeClaw.
//!
//! Every gated action attempt (allowed, denied, or failed) is recorded as an
//! [`AuditEvent`] in a per-project JSONL file at `.safeclaw/audit.jsonl`.
//! The `detail` field of every event passes through [`redact()`] before it
//! reaches disk, and each record carries the SHA-256 of the previous raw
//! line so edits and deletions can be detected.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use sc_audit::{AuditEvent, AuditStatus};
//!
//! let event = AuditEvent::new("todo_scan", AuditStatus::Ok)
//!     .with_detail("Found 2 marker(s)");
//! sc_audit::append("/path/to/project", event).unwrap();
//! let recent = sc_audit::read_recent("/path/to/project", 10).unwrap();
//! ```

pub mod error;
pub mod event;
pub mod hasher;
pub mod ledger;
pub mod redact;

pub use error::AuditError;
pub use event::{AuditEvent, AuditStatus};
pub use ledger::{append, ledger_path, read_recent, AuditLedger, AUDIT_DIR, AUDIT_FILE};
pub use redact::{redact, redaction_rule_names, redaction_rules, RedactionRule};
