// plan.rs: Plan types and parsing of backend output.
//
// Backends are asked for bare JSON, but models still wrap answers in
// markdown fences often enough that one leading and one trailing fence are
// stripped before parsing.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ParseErrorKind, PlanParseError};

static LEADING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```(?:json)?\s*").expect("leading fence pattern"));
static TRAILING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*```$").expect("trailing fence pattern"));

/// One proposed capability invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    #[serde(alias = "plugin")]
    pub capability: String,

    /// Relative to the project root.
    pub target: String,

    #[serde(default)]
    pub reason: String,
}

impl PlanStep {
    pub fn new(capability: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            target: target.into(),
            reason: String::new(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

/// Ordered steps plus the backend text they were parsed from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub steps: Vec<PlanStep>,
    #[serde(default)]
    pub raw_response: String,
}

impl ExecutionPlan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self {
            steps,
            raw_response: String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Parse backend output into a plan.
///
/// Accepts a JSON object with a `steps` array, optionally inside a markdown
/// code fence. Each step needs `capability` (or `plugin`) and `target`.
pub fn parse_plan(raw: &str) -> Result<ExecutionPlan, PlanParseError> {
    let fail = |kind| PlanParseError::new(kind, raw);

    let text = raw.trim();
    if text.is_empty() {
        return Err(fail(ParseErrorKind::EmptyResponse));
    }
    let text = LEADING_FENCE.replace(text, "");
    let text = TRAILING_FENCE.replace(&text, "");
    let text = text.trim();

    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| fail(ParseErrorKind::InvalidJson(e.to_string())))?;
    let Some(entries) = value.get("steps").and_then(serde_json::Value::as_array) else {
        return Err(fail(ParseErrorKind::MissingSteps));
    };

    let steps = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            PlanStep::deserialize(entry).map_err(|e| {
                fail(ParseErrorKind::InvalidStep {
                    index,
                    reason: e.to_string(),
                })
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ExecutionPlan {
        steps,
        raw_response: raw.to_string(),
    })
}
