// error.rs: Why a gated call did not succeed.
//
// These are not propagated as `Err`: the runner folds them into a
// `RunResult` and an audit record. The Display text is the user-facing
// message and the audit detail.

use std::path::PathBuf;

use sc_audit::AuditStatus;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunFailure {
    /// The capability is not on the policy allow-list.
    #[error("Capability '{capability}' is not in the allowed list")]
    Denied { capability: String },

    /// Allowed by policy but absent from the registry.
    #[error("Capability '{capability}' is not registered")]
    NotRegistered { capability: String },

    #[error(
        "Target path '{}' is outside project root '{}'",
        target.display(),
        root.display()
    )]
    OutsideRoot { target: PathBuf, root: PathBuf },

    /// The capability returned an error or panicked.
    #[error("Capability '{capability}' failed: {reason}")]
    Execution { capability: String, reason: String },

    #[error("Capability '{capability}' timed out after {seconds}s")]
    Timeout { capability: String, seconds: u64 },

    /// The outcome could not be written to the audit ledger.
    #[error("audit ledger unavailable: {reason}")]
    AuditUnavailable { reason: String },
}

impl RunFailure {
    /// Ledger status for this failure: policy rejections are `denied`,
    /// everything else is `error`.
    pub fn audit_status(&self) -> AuditStatus {
        match self {
            RunFailure::Denied { .. } | RunFailure::OutsideRoot { .. } => AuditStatus::Denied,
            _ => AuditStatus::Error,
        }
    }
}
