// policy.rs: Policy model and YAML loading.
//
// The policy file is a YAML mapping. Every key is optional; serde default
// functions supply the restrictive values. Loading distinguishes a missing
// file, an empty document, and a document of the wrong shape so the CLI can
// tell the user exactly what to fix.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::PolicyError;
use crate::paths;

/// File name the CLI looks for when `--policy` is not given.
pub const DEFAULT_POLICY_FILE: &str = "policy.yaml";

/// Ordered, duplicate-free list of capability names.
///
/// Order is user-visible (policy display, planner prompt) so deduplication
/// keeps the first occurrence of each name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AllowList(Vec<String>);

impl AllowList {
    /// Whether `name` is on the list. Matching is exact.
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut names: Vec<String> = Vec::new();
        for name in iter {
            let name = name.into();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Self(names)
    }
}

impl<'de> Deserialize<'de> for AllowList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        Ok(names.into_iter().collect())
    }
}

/// Resource limits applied to capability execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Files larger than this are skipped by the scanners.
    #[serde(default = "default_max_file_mb")]
    pub max_file_mb: u64,

    /// Upper bound on files a single scan will visit.
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Wall-clock budget for one capability run. `0` disables the limit.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_mb: default_max_file_mb(),
            max_files: default_max_files(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Limits {
    /// `max_file_mb` expressed in bytes.
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_mb.saturating_mul(1024 * 1024)
    }
}

/// Which text-generation backend the planner talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlannerBackend {
    /// Local chat endpoint (Ollama). The only backend that honours `base_url`.
    #[default]
    #[serde(rename = "ollama")]
    Ollama,
    /// Hosted chat-completions API (OpenAI).
    #[serde(rename = "openai")]
    OpenAi,
    /// Hosted messages API (Anthropic).
    #[serde(rename = "anthropic")]
    Anthropic,
}

impl fmt::Display for PlannerBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerBackend::Ollama => write!(f, "ollama"),
            PlannerBackend::OpenAi => write!(f, "openai"),
            PlannerBackend::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// Planner settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub backend: PlannerBackend,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the environment variable holding the API key (hosted backends).
    #[serde(default, rename = "api_key_env")]
    pub api_key_env_var: String,

    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    #[serde(default = "default_true")]
    pub require_confirmation: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: PlannerBackend::default(),
            model: default_model(),
            base_url: default_base_url(),
            api_key_env_var: String::new(),
            max_steps: default_max_steps(),
            require_confirmation: true,
        }
    }
}

/// Localhost dashboard settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_dashboard_host")]
    pub host: String,

    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_dashboard_host(),
            port: default_dashboard_port(),
        }
    }
}

/// The security policy governing every gated action.
///
/// Constructed once, never mutated afterwards. Share it by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    #[serde(default = "default_sandbox_subdir")]
    pub sandbox_subdir: String,

    #[serde(default)]
    pub allow_network: bool,

    #[serde(default)]
    pub allow_shell: bool,

    /// Capabilities the runner may execute. Serialized as `allowed_plugins`.
    #[serde(default, rename = "allowed_plugins")]
    pub allowed_capabilities: AllowList,

    #[serde(default)]
    pub limits: Limits,

    #[serde(default)]
    pub planner: PlannerConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            sandbox_subdir: default_sandbox_subdir(),
            allow_network: false,
            allow_shell: false,
            allowed_capabilities: AllowList::default(),
            limits: Limits::default(),
            planner: PlannerConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

impl Policy {
    /// A maximally restrictive policy rooted at `project_root`.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    /// Replace the allow-list (builder style). Duplicates are dropped.
    pub fn with_allowed_capabilities<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_capabilities = names.into_iter().collect();
        self
    }

    /// Replace the planner settings (builder style).
    pub fn with_planner(mut self, planner: PlannerConfig) -> Self {
        self.planner = planner;
        self
    }

    /// Replace the resource limits (builder style).
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Load and validate a YAML policy file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(PolicyError::ConfigNotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(source) => {
                return Err(PolicyError::ConfigUnreadable {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let policy = Self::parse(&text, path)?;
        tracing::debug!(
            "loaded policy from {} ({} allowed capabilities)",
            path.display(),
            policy.allowed_capabilities.len()
        );
        Ok(policy)
    }

    /// Parse policy YAML. `origin` is only used in error messages.
    pub fn parse(text: &str, origin: &Path) -> Result<Self, PolicyError> {
        let malformed = |reason: String| PolicyError::ConfigMalformed {
            path: origin.to_path_buf(),
            reason,
        };

        let value: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|e| malformed(e.to_string()))?;
        match value {
            serde_yaml::Value::Null => Err(PolicyError::ConfigEmpty {
                path: origin.to_path_buf(),
            }),
            serde_yaml::Value::Mapping(_) => {
                serde_yaml::from_value(value).map_err(|e| malformed(e.to_string()))
            }
            _ => Err(malformed("expected a YAML mapping at the top level".into())),
        }
    }

    /// Absolute project root, canonicalized as far as it exists on disk.
    pub fn resolved_root(&self) -> PathBuf {
        paths::resolve(&self.project_root)
    }

    /// The sandbox directory: resolved root joined with `sandbox_subdir`.
    pub fn resolved_sandbox_path(&self) -> PathBuf {
        self.resolved_root().join(&self.sandbox_subdir)
    }

    pub fn is_capability_allowed(&self, name: &str) -> bool {
        self.allowed_capabilities.contains(name)
    }

    /// Resolve `target` and check that it lies inside the project root.
    ///
    /// Relative targets resolve against the process working directory.
    /// Returns the resolved path either way: `Ok` when contained, `Err` when
    /// it escapes.
    pub fn contain(&self, target: impl AsRef<Path>) -> Result<PathBuf, PathBuf> {
        let root = self.resolved_root();
        let resolved = paths::resolve(target.as_ref());
        if paths::is_within(&root, &resolved) {
            Ok(resolved)
        } else {
            Err(resolved)
        }
    }

    /// Like [`Policy::contain`], but relative targets are taken relative to
    /// the project root (plan steps are written that way).
    pub fn contain_relative(&self, target: impl AsRef<Path>) -> Result<PathBuf, PathBuf> {
        self.contain(self.resolved_root().join(target))
    }
}

// Serde default functions
fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_sandbox_subdir() -> String {
    "AI_SANDBOX".to_string()
}

fn default_max_file_mb() -> u64 {
    5
}

fn default_max_files() -> usize {
    2000
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_model() -> String {
    "qwen2.5-coder:14b".to_string()
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_max_steps() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_dashboard_host() -> String {
    "127.0.0.1".to_string()
}

fn default_dashboard_port() -> u16 {
    8321
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_policy(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("policy.yaml");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn defaults_are_restrictive() {
        let policy = Policy::default();
        assert!(!policy.allow_network);
        assert!(!policy.allow_shell);
        assert!(policy.allowed_capabilities.is_empty());
        assert!(!policy.planner.enabled);
        assert!(!policy.dashboard.enabled);
        assert!(policy.planner.require_confirmation);
        assert_eq!(policy.limits.max_file_mb, 5);
        assert_eq!(policy.limits.max_files, 2000);
        assert_eq!(policy.limits.timeout_seconds, 30);
    }

    #[test]
    fn allow_list_deduplicates_in_first_seen_order() {
        let policy = Policy::new(".").with_allowed_capabilities(["a", "b", "a"]);
        assert_eq!(policy.allowed_capabilities.as_slice(), ["a", "b"]);
    }

    #[test]
    fn allow_list_deduplicates_when_loaded() {
        let dir = tempdir().unwrap();
        let path = write_policy(
            dir.path(),
            "allowed_plugins:\n  - repo_stats\n  - todo_scan\n  - repo_stats\n",
        );
        let policy = Policy::load(&path).unwrap();
        assert_eq!(
            policy.allowed_capabilities.as_slice(),
            ["repo_stats", "todo_scan"]
        );
    }

    #[test]
    fn load_full_policy() {
        let dir = tempdir().unwrap();
        let path = write_policy(
            dir.path(),
            r#"
project_root: /srv/project
sandbox_subdir: SANDBOX
allow_network: true
allowed_plugins: [todo_scan]
limits:
  max_file_mb: 1
planner:
  enabled: true
  backend: anthropic
  api_key_env: ANTHROPIC_API_KEY
  max_steps: 3
dashboard:
  port: 9000
"#,
        );
        let policy = Policy::load(&path).unwrap();
        assert_eq!(policy.project_root, PathBuf::from("/srv/project"));
        assert_eq!(policy.sandbox_subdir, "SANDBOX");
        assert!(policy.allow_network);
        assert!(!policy.allow_shell);
        assert_eq!(policy.limits.max_file_mb, 1);
        // Unspecified limits keep their defaults.
        assert_eq!(policy.limits.max_files, 2000);
        assert_eq!(policy.planner.backend, PlannerBackend::Anthropic);
        assert_eq!(policy.planner.api_key_env_var, "ANTHROPIC_API_KEY");
        assert_eq!(policy.planner.max_steps, 3);
        assert_eq!(policy.dashboard.port, 9000);
        assert_eq!(policy.dashboard.host, "127.0.0.1");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = Policy::load(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, PolicyError::ConfigNotFound { .. }));
    }

    #[test]
    fn empty_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = write_policy(dir.path(), "# nothing here\n");
        let err = Policy::load(&path).unwrap_err();
        assert!(matches!(err, PolicyError::ConfigEmpty { .. }));
    }

    #[test]
    fn top_level_list_is_malformed() {
        let dir = tempdir().unwrap();
        let path = write_policy(dir.path(), "- just\n- a list\n");
        let err = Policy::load(&path).unwrap_err();
        assert!(matches!(err, PolicyError::ConfigMalformed { .. }));
    }

    #[test]
    fn unknown_backend_is_malformed() {
        let err = Policy::parse("planner:\n  backend: skynet\n", Path::new("inline")).unwrap_err();
        assert!(matches!(err, PolicyError::ConfigMalformed { .. }));
    }

    #[test]
    fn wrong_field_type_is_malformed() {
        let err = Policy::parse("allow_network: maybe\n", Path::new("inline")).unwrap_err();
        assert!(matches!(err, PolicyError::ConfigMalformed { .. }));
    }

    #[test]
    fn sandbox_path_is_under_root() {
        let dir = tempdir().unwrap();
        let policy = Policy::new(dir.path());
        let root = policy.resolved_root();
        assert!(root.is_absolute());
        assert_eq!(policy.resolved_sandbox_path(), root.join("AI_SANDBOX"));
    }

    #[test]
    fn contain_accepts_inside_and_rejects_outside() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        let policy = Policy::new(dir.path());

        assert!(policy.contain(dir.path().join("src")).is_ok());
        assert!(policy.contain_relative("src/../src").is_ok());
        assert!(policy.contain_relative("../elsewhere").is_err());
        assert!(policy.contain_relative("/etc/passwd").is_err());
    }

    #[test]
    fn backend_display_matches_config_names() {
        assert_eq!(PlannerBackend::OpenAi.to_string(), "openai");
        let parsed: PlannerBackend = serde_yaml::from_str("openai").unwrap();
        assert_eq!(parsed, PlannerBackend::OpenAi);
    }
}
