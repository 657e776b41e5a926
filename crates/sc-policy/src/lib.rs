//! # sc-policy
//!
//! The "default deny" policy model for SafeClaw.
//!
//! A [`Policy`] is loaded once per invocation from a YAML file and shared
//! read-only with the runner, the plan validator, and the planner. Every
//! field is optional; anything left out resolves to its most restrictive
//! value.
//!
//! ## Key invariants
//!
//! - **Default deny**: network and shell access are off and the capability
//!   allow-list is empty unless the policy file says otherwise.
//! - **Deterministic allow-list**: duplicates are dropped at construction,
//!   keeping first-seen order.
//! - **Containment**: targets are checked against the canonicalized project
//!   root, so `..` traversal and symlink escapes are both rejected.

pub mod error;
pub mod paths;
pub mod policy;

pub use error::PolicyError;
pub use policy::{
    AllowList, DashboardConfig, Limits, PlannerBackend, PlannerConfig, Policy,
    DEFAULT_POLICY_FILE,
};
