// secrets_scan.rs: Detect hardcoded credentials using the redaction rules.
//
// Findings name the file and the rule that matched. The matched text itself
// never appears in the report, so the report is safe to log and audit.

use std::path::Path;

use sc_audit::redaction_rules;
use sc_policy::Policy;

use super::walk;
use crate::capability::{Capability, CapabilityError, CapabilityOutput};

const SCANNABLE_EXTENSIONS: &[&str] = &[
    ".py", ".yaml", ".yml", ".json", ".txt", ".log", ".toml", ".cfg", ".ini", ".sh", ".bash",
    ".js", ".ts",
];

// Dotfiles have no extension, so they are matched by full name.
const SCANNABLE_NAMES: &[&str] = &[".env", ".env.local", ".env.example"];

pub struct SecretsScan;

impl SecretsScan {
    fn is_scannable(path: &Path, max_bytes: u64) -> bool {
        let by_ext = walk::extension_of(path)
            .map(|ext| SCANNABLE_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false);
        let by_name = path
            .file_name()
            .map(|n| SCANNABLE_NAMES.contains(&n.to_string_lossy().to_lowercase().as_str()))
            .unwrap_or(false);
        (by_ext || by_name) && walk::within_size(path, max_bytes)
    }
}

impl Capability for SecretsScan {
    fn name(&self) -> &str {
        "secrets_scan"
    }

    fn description(&self) -> &str {
        "Scan for hardcoded secrets and credentials"
    }

    fn execute(&self, policy: &Policy, target: &Path) -> Result<CapabilityOutput, CapabilityError> {
        let max_bytes = policy.limits.max_file_bytes();
        let files = walk::collect(target, policy.limits.max_files, |p| {
            Self::is_scannable(p, max_bytes)
        });

        let mut findings = Vec::new();
        for file in &files {
            let content = match walk::read_text_lossy(file) {
                Ok(content) => content,
                Err(e) => {
                    tracing::debug!("secrets_scan: skipping {}: {}", file.display(), e);
                    continue;
                }
            };
            for rule in redaction_rules() {
                if rule.pattern.is_match(&content) {
                    findings.push(format!("  {}: {}", walk::display_name(file, target), rule.name));
                }
            }
        }

        let message = if findings.is_empty() {
            format!("No secrets detected in {} file(s).", files.len())
        } else {
            format!(
                "Found {} potential secret(s) in {} file(s):\n{}",
                findings.len(),
                files.len(),
                findings.join("\n")
            )
        };
        Ok(CapabilityOutput::new(message, files))
    }
}
