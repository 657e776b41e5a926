// error.rs: Error types for plan generation.

use sc_audit::AuditError;
use thiserror::Error;

/// Why backend text could not be turned into a plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("LLM returned an empty response.")]
    EmptyResponse,

    #[error("Invalid JSON from LLM: {0}")]
    InvalidJson(String),

    #[error("LLM JSON missing 'steps' list.")]
    MissingSteps,

    #[error("Step {index} is malformed: {reason}")]
    InvalidStep { index: usize, reason: String },
}

/// A parse failure, carrying the raw backend text for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct PlanParseError {
    pub kind: ParseErrorKind,
    pub raw_response: String,
}

impl PlanParseError {
    pub fn new(kind: ParseErrorKind, raw_response: impl Into<String>) -> Self {
        Self {
            kind,
            raw_response: raw_response.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Planner is disabled in policy.yaml. Set planner.enabled: true to use this feature.")]
    Disabled,

    #[error(
        "Planner requires network access to reach {endpoint}. \
         Set allow_network: true or use a local Ollama instance."
    )]
    NetworkDenied { endpoint: String },

    /// The backend could not be reached, rejected the request, or answered
    /// with an unexpected envelope.
    #[error("{0}")]
    Connection(String),

    #[error(transparent)]
    Parse(#[from] PlanParseError),

    /// The request could not be recorded, so it was not sent.
    #[error("planner request not sent: {0}")]
    Audit(#[from] AuditError),
}
