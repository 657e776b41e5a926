// error.rs: Error types for policy loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a policy file.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The policy file does not exist.
    #[error("policy file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// The policy file exists but could not be read.
    #[error("failed to read policy file {}: {source}", path.display())]
    ConfigUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The policy file parses to nothing (empty or comments only).
    #[error("policy file is empty: {}", path.display())]
    ConfigEmpty { path: PathBuf },

    /// The policy file is not a YAML mapping of the expected shape.
    #[error("policy file is malformed ({}): {reason}", path.display())]
    ConfigMalformed { path: PathBuf, reason: String },
}
