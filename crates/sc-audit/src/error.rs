// error.rs: Error types for the audit ledger.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during audit operations.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Failed to create the ledger directory or open the ledger file.
    #[error("failed to open audit ledger at {}: {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write or read a record.
    #[error("audit ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialized or a line could not be parsed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The hash chain is broken: a record was edited, removed, or inserted.
    #[error("integrity check failed at line {line}: expected previous hash {expected}, got {actual}")]
    IntegrityViolation {
        line: usize,
        expected: String,
        actual: String,
    },
}
