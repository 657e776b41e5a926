// repo_stats.rs: File counts, lines of code, and extension distribution.

use std::collections::HashMap;
use std::path::Path;

use sc_policy::Policy;

use super::todo_scan::TEXT_EXTENSIONS;
use super::walk;
use crate::capability::{Capability, CapabilityError, CapabilityOutput};

/// Extensions shown in the distribution table.
const TOP_EXTENSIONS: usize = 15;

const NO_EXTENSION: &str = "(no ext)";

/// Extension frequencies in first-seen order, so equal counts keep a stable
/// order once sorted.
#[derive(Default)]
struct ExtensionCounts {
    order: Vec<String>,
    counts: HashMap<String, usize>,
}

impl ExtensionCounts {
    fn add(&mut self, ext: &str) {
        match self.counts.get_mut(ext) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(ext.to_string(), 1);
                self.order.push(ext.to_string());
            }
        }
    }

    fn most_common(&self, n: usize) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .order
            .iter()
            .map(|ext| (ext.as_str(), self.counts[ext]))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}

fn is_code(ext: &str) -> bool {
    ext != ".env" && TEXT_EXTENSIONS.contains(&ext)
}

pub struct RepoStats;

impl Capability for RepoStats {
    fn name(&self) -> &str {
        "repo_stats"
    }

    fn description(&self) -> &str {
        "Repository statistics (file counts, LOC, file types)"
    }

    fn execute(&self, policy: &Policy, target: &Path) -> Result<CapabilityOutput, CapabilityError> {
        let dir = if target.is_file() {
            target.parent().unwrap_or(target)
        } else {
            target
        };
        let max_bytes = policy.limits.max_file_bytes();

        let files = walk::collect(dir, policy.limits.max_files, |_| true);

        let mut extensions = ExtensionCounts::default();
        let mut total_lines = 0usize;
        for file in &files {
            let ext = walk::extension_of(file).unwrap_or_else(|| NO_EXTENSION.to_string());
            extensions.add(&ext);

            if !is_code(&ext) || !walk::within_size(file, max_bytes) {
                continue;
            }
            match walk::read_text_lossy(file) {
                Ok(text) => total_lines += text.lines().count(),
                Err(e) => tracing::debug!("repo_stats: skipping {}: {}", file.display(), e),
            }
        }

        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut parts = vec![
            format!("Repository: {name}"),
            format!("Total files: {}", files.len()),
            format!("Total lines of code: {total_lines}"),
            String::new(),
            "File type distribution:".to_string(),
        ];
        parts.extend(
            extensions
                .most_common(TOP_EXTENSIONS)
                .into_iter()
                .map(|(ext, count)| format!("  {ext:12} {count}")),
        );

        Ok(CapabilityOutput::new(parts.join("\n"), files))
    }
}
