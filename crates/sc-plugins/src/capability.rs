// capability.rs: The Capability trait and its result types.

use std::path::{Path, PathBuf};

use sc_policy::Policy;
use thiserror::Error;

/// Errors a capability may return. The runner treats them opaquely and
/// records their description.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("{0}")]
    Failed(String),
}

/// What a successful capability run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityOutput {
    /// Human-readable report.
    pub message: String,
    /// Files read or written, in visit order.
    pub touched_files: Vec<PathBuf>,
}

impl CapabilityOutput {
    pub fn new(message: impl Into<String>, touched_files: Vec<PathBuf>) -> Self {
        Self {
            message: message.into(),
            touched_files,
        }
    }
}

/// A named unit of work that can only be invoked through the runner.
///
/// `target` has already been resolved and checked against the project root.
/// Implementations must be `Send + Sync`: the runner executes them on a
/// worker thread so it can enforce the policy timeout.
pub trait Capability: Send + Sync {
    /// Registered name. Also the name used in policy allow-lists.
    fn name(&self) -> &str;

    /// One-line description for listings.
    fn description(&self) -> &str;

    fn execute(&self, policy: &Policy, target: &Path) -> Result<CapabilityOutput, CapabilityError>;
}
