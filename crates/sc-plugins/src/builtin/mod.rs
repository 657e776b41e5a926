//! Built-in capabilities.

use std::sync::Arc;

use crate::capability::Capability;

pub mod deps_audit;
pub mod log_summarize;
pub mod repo_stats;
pub mod secrets_scan;
pub mod todo_scan;
mod walk;

pub use deps_audit::DepsAudit;
pub use log_summarize::LogSummarize;
pub use repo_stats::RepoStats;
pub use secrets_scan::SecretsScan;
pub use todo_scan::TodoScan;

/// One instance of every built-in capability.
pub fn all() -> Vec<Arc<dyn Capability>> {
    vec![
        Arc::new(TodoScan),
        Arc::new(LogSummarize),
        Arc::new(SecretsScan),
        Arc::new(DepsAudit),
        Arc::new(RepoStats),
    ]
}
