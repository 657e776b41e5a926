// log_summarize.rs: Pull error, exception, and failure lines out of a log.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use sc_policy::Policy;

use super::walk;
use crate::capability::{Capability, CapabilityError, CapabilityOutput};

static NOTABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(error|exception|failed|traceback)\b").expect("notable-line pattern")
});

/// Notable lines listed before the summary is truncated.
const MAX_LISTED: usize = 20;

pub struct LogSummarize;

impl Capability for LogSummarize {
    fn name(&self) -> &str {
        "log_summarize"
    }

    fn description(&self) -> &str {
        "Summarise a log file (errors, exceptions, failures)"
    }

    fn execute(&self, policy: &Policy, target: &Path) -> Result<CapabilityOutput, CapabilityError> {
        if !target.is_file() {
            return Ok(CapabilityOutput::new(
                format!("Target is not a file: {}", target.display()),
                vec![],
            ));
        }

        let size = fs::metadata(target)
            .map_err(|source| CapabilityError::Io {
                path: target.to_path_buf(),
                source,
            })?
            .len();
        if size > policy.limits.max_file_bytes() {
            return Ok(CapabilityOutput::new(
                format!(
                    "File too large ({:.1} MB, limit {} MB)",
                    size as f64 / (1024.0 * 1024.0),
                    policy.limits.max_file_mb
                ),
                vec![],
            ));
        }

        let text = walk::read_text_lossy(target).map_err(|source| CapabilityError::Io {
            path: target.to_path_buf(),
            source,
        })?;

        let lines: Vec<&str> = text.lines().collect();
        let notable: Vec<String> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| NOTABLE.is_match(line))
            .map(|(index, line)| format!("  L{}: {}", index + 1, line.trim()))
            .collect();

        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut parts = vec![format!("Log: {} ({} lines total)", name, lines.len())];
        if notable.is_empty() {
            parts.push("No errors/exceptions/failures detected.".to_string());
        } else {
            parts.push(format!("Found {} notable line(s):", notable.len()));
            parts.extend(notable.iter().take(MAX_LISTED).cloned());
            if notable.len() > MAX_LISTED {
                parts.push(format!("  ... and {} more", notable.len() - MAX_LISTED));
            }
        }

        Ok(CapabilityOutput::new(
            parts.join("\n"),
            vec![target.to_path_buf()],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn extracts_notable_lines_and_counts_total() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("build.log");
        fs::write(
            &log,
            "[INFO] Starting build\n[ERROR] Failed to compile module\n[INFO] Retrying...\n[ERROR] Traceback (most recent call last):\n[INFO] Build complete\n",
        )
        .unwrap();

        let out = LogSummarize.execute(&Policy::new(dir.path()), &log).unwrap();
        assert!(out.message.contains("(5 lines total)"));
        assert!(out.message.contains("Found 2 notable line(s):"));
        assert!(out.message.contains("L2: [ERROR] Failed to compile module"));
        assert_eq!(out.touched_files, vec![log]);
    }

    #[test]
    fn clean_log_reports_nothing_found() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("clean.log");
        fs::write(&log, "[INFO] All good\n[INFO] Done\n").unwrap();
        let out = LogSummarize.execute(&Policy::new(dir.path()), &log).unwrap();
        assert!(out.message.contains("No errors"));
    }

    #[test]
    fn directory_target_is_reported() {
        let dir = tempdir().unwrap();
        let out = LogSummarize
            .execute(&Policy::new(dir.path()), dir.path())
            .unwrap();
        assert!(out.message.to_lowercase().contains("not a file"));
        assert!(out.touched_files.is_empty());
    }

    #[test]
    fn long_logs_are_truncated() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("noisy.log");
        fs::write(&log, "error here\n".repeat(25)).unwrap();
        let out = LogSummarize.execute(&Policy::new(dir.path()), &log).unwrap();
        assert!(out.message.contains("... and 5 more"));
    }
}
