// registry.rs: Static capability table.
//
// The registry is an ordinary value: build it once in `main` (or a test),
// then pass it by reference to the runner and any listing surface. There is
// no process-wide global and no loading of capabilities from disk.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::builtin;
use crate::capability::Capability;

/// Listing entry for a registered capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityInfo {
    pub name: String,
    pub description: String,
}

/// Maps capability names to implementations.
#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    entries: BTreeMap<String, Arc<dyn Capability>>,
    built: bool,
}

impl CapabilityRegistry {
    /// An empty registry. Call [`CapabilityRegistry::build`] to add the
    /// built-in capabilities.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in capability.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.build();
        registry
    }

    /// Register the built-in capabilities. A second call is a no-op.
    pub fn build(&mut self) {
        if self.built {
            return;
        }
        for capability in builtin::all() {
            self.register(capability);
        }
        self.built = true;
        tracing::debug!("capability registry built with {} entries", self.len());
    }

    /// Register one capability under its own name, replacing any previous
    /// entry with that name.
    pub fn register(&mut self, capability: Arc<dyn Capability>) {
        let name = capability.name().to_string();
        if self.entries.insert(name.clone(), capability).is_some() {
            tracing::warn!("capability '{}' registered twice; keeping the latest", name);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.entries.get(name).cloned()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Name and description of every entry, sorted by name.
    pub fn describe(&self) -> Vec<CapabilityInfo> {
        self.entries
            .iter()
            .map(|(name, cap)| CapabilityInfo {
                name: name.clone(),
                description: cap.description().to_string(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("names", &self.names())
            .field("built", &self.built)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CapabilityError, CapabilityOutput};
    use sc_policy::Policy;
    use std::path::Path;

    struct Echo;

    impl Capability for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "returns its target"
        }
        fn execute(&self, _: &Policy, target: &Path) -> Result<CapabilityOutput, CapabilityError> {
            Ok(CapabilityOutput::new(target.display().to_string(), vec![]))
        }
    }

    #[test]
    fn builtin_registry_lists_all_scanners() {
        let registry = CapabilityRegistry::builtin();
        assert_eq!(
            registry.names(),
            vec![
                "deps_audit",
                "log_summarize",
                "repo_stats",
                "secrets_scan",
                "todo_scan"
            ]
        );
    }

    #[test]
    fn build_is_idempotent() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(Echo));
        registry.build();
        registry.build();
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn lookup_finds_registered_and_misses_unknown() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(Echo));
        assert!(registry.lookup("echo").is_some());
        assert!(registry.lookup("todo_scan").is_none());
        assert!(registry.lookup("").is_none());
    }

    #[test]
    fn describe_is_sorted_by_name() {
        let mut registry = CapabilityRegistry::builtin();
        registry.register(Arc::new(Echo));
        let listing = registry.describe();
        assert_eq!(listing[0].name, "deps_audit");
        assert_eq!(listing[1].name, "echo");
        assert_eq!(listing[1].description, "returns its target");
    }
}
