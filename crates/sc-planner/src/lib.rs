//! # sc-planner
//!
//! Optional plan generation for SafeClaw.
//!
//! A [`Planner`] asks a text-generation backend (local Ollama, or hosted
//! OpenAI / Anthropic) to turn a task description into an [`ExecutionPlan`].
//! Plans are proposals only. [`validate`] checks a plan against the same
//! [`sc_policy::Policy`] the runner enforces, reporting every violation, and
//! the runner still re-checks each step when it executes.
//!
//! The planner is off by default and refuses non-loopback backends unless
//! the policy allows network access.

pub mod backend;
pub mod error;
pub mod plan;
pub mod planner;
pub mod validate;

pub use backend::{is_loopback, ChatBackend};
pub use error::{ParseErrorKind, PlanParseError, PlannerError};
pub use plan::{parse_plan, ExecutionPlan, PlanStep};
pub use planner::Planner;
pub use validate::{validate, PlanValidationResult};
