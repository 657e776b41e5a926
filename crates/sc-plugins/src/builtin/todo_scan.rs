// todo_scan.rs: TODO / FIXME / HACK marker scanner.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use sc_policy::Policy;

use super::walk;
use crate::capability::{Capability, CapabilityError, CapabilityOutput};

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(TODO|FIXME|HACK)\b").expect("marker pattern"));

/// Extensions treated as scannable text.
pub(crate) const TEXT_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".ts", ".jsx", ".tsx", ".java", ".c", ".cpp", ".h", ".go", ".rs", ".rb",
    ".php", ".sh", ".bash", ".yaml", ".yml", ".toml", ".json", ".xml", ".html", ".css", ".md",
    ".txt", ".cfg", ".ini", ".env", ".sql", ".r", ".kt", ".swift", ".cs",
];

pub struct TodoScan;

impl TodoScan {
    fn is_scannable(path: &Path, max_bytes: u64) -> bool {
        let known = walk::extension_of(path)
            .map(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false);
        known && walk::within_size(path, max_bytes)
    }
}

impl Capability for TodoScan {
    fn name(&self) -> &str {
        "todo_scan"
    }

    fn description(&self) -> &str {
        "Scan for TODO / FIXME / HACK markers"
    }

    fn execute(&self, policy: &Policy, target: &Path) -> Result<CapabilityOutput, CapabilityError> {
        let max_bytes = policy.limits.max_file_bytes();
        let files = walk::collect(target, policy.limits.max_files, |p| {
            Self::is_scannable(p, max_bytes)
        });

        let mut matches = Vec::new();
        for file in &files {
            let text = match walk::read_text_lossy(file) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!("todo_scan: skipping {}: {}", file.display(), e);
                    continue;
                }
            };
            for (index, line) in text.lines().enumerate() {
                if MARKER.is_match(line) {
                    matches.push(format!(
                        "  {}:{}: {}",
                        walk::display_name(file, target),
                        index + 1,
                        line.trim()
                    ));
                }
            }
        }

        let message = if matches.is_empty() {
            format!(
                "No TODO/FIXME/HACK markers found in {} file(s).",
                files.len()
            )
        } else {
            format!(
                "Found {} marker(s) in {} file(s):\n{}",
                matches.len(),
                files.len(),
                matches.join("\n")
            )
        };
        Ok(CapabilityOutput::new(message, files))
    }
}
