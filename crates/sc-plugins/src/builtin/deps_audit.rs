// deps_audit.rs: Static dependency listing. No network access.
//
// Reads `requirements.txt`, `pyproject.toml` ([project] dependencies) and
// `Cargo.toml` ([dependencies]) in the target directory and lists what they
// declare. Two heuristics produce warnings: Python packages pinned exactly to
// a 0.x release, and Cargo dependencies with a `*` version.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use sc_policy::Policy;

use super::walk;
use crate::capability::{Capability, CapabilityError, CapabilityOutput};

static REQUIREMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_\-\.]+)\s*(.*)").expect("requirement pattern"));

static ZERO_PIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^==\s*0(\.|$)").expect("pin pattern"));

/// One declared dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    /// Version specifier as written, or a short description of the source.
    pub spec: String,
    pub ecosystem: Ecosystem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ecosystem {
    Python,
    Cargo,
}

impl Dependency {
    fn python(name: &str, spec: &str) -> Self {
        Self {
            name: name.to_string(),
            spec: spec.trim().to_string(),
            ecosystem: Ecosystem::Python,
        }
    }

    fn warning(&self) -> Option<String> {
        match self.ecosystem {
            Ecosystem::Python if ZERO_PIN.is_match(&self.spec) => Some(format!(
                "  {} {}: pinned to 0.x (may be outdated)",
                self.name, self.spec
            )),
            Ecosystem::Cargo if self.spec == "*" => {
                Some(format!("  {} *: unbounded version requirement", self.name))
            }
            _ => None,
        }
    }
}

/// Parse a requirements.txt body. Comments, blank lines, and option lines
/// (`-r`, `-e`, ...) are skipped.
pub fn parse_requirements(text: &str) -> Vec<Dependency> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .filter_map(|line| REQUIREMENT.captures(line))
        .map(|caps| Dependency::python(&caps[1], &caps[2]))
        .collect()
}

/// Parse `[project] dependencies` from a pyproject.toml body.
pub fn parse_pyproject(text: &str) -> Result<Vec<Dependency>, String> {
    let doc: toml::Value = toml::from_str(text).map_err(|e| e.to_string())?;
    let entries = doc
        .get("project")
        .and_then(|p| p.get("dependencies"))
        .and_then(toml::Value::as_array);

    Ok(entries
        .into_iter()
        .flatten()
        .filter_map(toml::Value::as_str)
        .filter_map(|entry| REQUIREMENT.captures(entry.trim()))
        .map(|caps| Dependency::python(&caps[1], &caps[2]))
        .collect())
}

/// Parse `[dependencies]` from a Cargo.toml body.
pub fn parse_cargo_manifest(text: &str) -> Result<Vec<Dependency>, String> {
    let doc: toml::Value = toml::from_str(text).map_err(|e| e.to_string())?;
    let Some(table) = doc.get("dependencies").and_then(toml::Value::as_table) else {
        return Ok(Vec::new());
    };

    Ok(table
        .iter()
        .map(|(name, value)| Dependency {
            name: name.clone(),
            spec: cargo_spec(value),
            ecosystem: Ecosystem::Cargo,
        })
        .collect())
}

fn cargo_spec(value: &toml::Value) -> String {
    if let Some(version) = value.as_str() {
        return version.to_string();
    }
    let field = |key: &str| value.get(key).and_then(toml::Value::as_str);
    if let Some(version) = field("version") {
        version.to_string()
    } else if value.get("workspace").and_then(toml::Value::as_bool) == Some(true) {
        "(workspace)".to_string()
    } else if let Some(path) = field("path") {
        format!("path = {path}")
    } else if let Some(git) = field("git") {
        format!("git = {git}")
    } else {
        "(unspecified)".to_string()
    }
}

pub struct DepsAudit;

impl DepsAudit {
    fn read(path: &Path) -> Result<String, CapabilityError> {
        walk::read_text_lossy(path).map_err(|source| CapabilityError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn parse_error(path: &Path, reason: String) -> CapabilityError {
        CapabilityError::Parse {
            path: path.to_path_buf(),
            reason,
        }
    }
}

impl Capability for DepsAudit {
    fn name(&self) -> &str {
        "deps_audit"
    }

    fn description(&self) -> &str {
        "Audit declared dependencies (requirements.txt, pyproject.toml, Cargo.toml)"
    }

    fn execute(&self, _policy: &Policy, target: &Path) -> Result<CapabilityOutput, CapabilityError> {
        let dir = if target.is_file() {
            target.parent().unwrap_or(target)
        } else {
            target
        };

        let mut deps = Vec::new();
        let mut touched: Vec<PathBuf> = Vec::new();

        let requirements = dir.join("requirements.txt");
        if requirements.is_file() {
            deps.extend(parse_requirements(&Self::read(&requirements)?));
            touched.push(requirements);
        }

        let pyproject = dir.join("pyproject.toml");
        if pyproject.is_file() {
            let parsed = parse_pyproject(&Self::read(&pyproject)?)
                .map_err(|reason| Self::parse_error(&pyproject, reason))?;
            deps.extend(parsed);
            touched.push(pyproject);
        }

        let cargo = dir.join("Cargo.toml");
        if cargo.is_file() {
            let parsed = parse_cargo_manifest(&Self::read(&cargo)?)
                .map_err(|reason| Self::parse_error(&cargo, reason))?;
            deps.extend(parsed);
            touched.push(cargo);
        }

        if deps.is_empty() {
            return Ok(CapabilityOutput::new(
                "No dependency files found (requirements.txt / pyproject.toml / Cargo.toml).",
                touched,
            ));
        }

        let mut parts = vec![format!("Found {} declared dependency/ies:", deps.len())];
        parts.extend(
            deps.iter()
                .map(|d| format!("  {} {}", d.name, d.spec).trim_end().to_string()),
        );

        let warnings: Vec<String> = deps.iter().filter_map(Dependency::warning).collect();
        if !warnings.is_empty() {
            parts.push(format!("\nWarnings ({}):", warnings.len()));
            parts.extend(warnings);
        }

        Ok(CapabilityOutput::new(parts.join("\n"), touched))
    }
}
