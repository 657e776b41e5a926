//! # sc-plugins
//!
//! Capabilities are the only side-effecting units SafeClaw will run. Each one
//! implements the [`Capability`] trait and is registered by name in a
//! [`CapabilityRegistry`] built once at process start. Nothing here checks
//! policy; the runner in `sc-runner` does that before calling
//! [`Capability::execute`].
//!
//! Built-in capabilities:
//!
//! | name            | what it does                                         |
//! |-----------------|------------------------------------------------------|
//! | `todo_scan`     | TODO / FIXME / HACK markers in text files            |
//! | `log_summarize` | error and failure lines from one log file            |
//! | `secrets_scan`  | hardcoded credentials, reported by rule name only    |
//! | `deps_audit`    | declared dependencies in Python and Cargo manifests  |
//! | `repo_stats`    | file counts, line counts, extension distribution     |

pub mod builtin;
pub mod capability;
pub mod registry;

pub use capability::{Capability, CapabilityError, CapabilityOutput};
pub use registry::{CapabilityInfo, CapabilityRegistry};
