// validate.rs: Check a plan against the active policy before anything runs.

use sc_policy::Policy;
use serde::Serialize;

use crate::plan::ExecutionPlan;

/// Outcome of [`validate`]. `validated` is true exactly when
/// `rejected_steps` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanValidationResult {
    pub validated: bool,
    pub rejected_steps: Vec<String>,
}

impl PlanValidationResult {
    fn from_rejections(rejected_steps: Vec<String>) -> Self {
        Self {
            validated: rejected_steps.is_empty(),
            rejected_steps,
        }
    }
}

/// Validate every step of `plan` and report all violations.
///
/// An over-long plan is rejected as a whole without looking at its steps.
/// Otherwise each step is checked for allow-list membership and for a target
/// inside the project root; one step can produce both rejections.
pub fn validate(plan: &ExecutionPlan, policy: &Policy) -> PlanValidationResult {
    let max_steps = policy.planner.max_steps;
    if plan.steps.len() > max_steps {
        return PlanValidationResult::from_rejections(vec![format!(
            "Plan has {} steps (max {})",
            plan.steps.len(),
            max_steps
        )]);
    }

    let mut rejected = Vec::new();
    for step in &plan.steps {
        if !policy.is_capability_allowed(&step.capability) {
            rejected.push(format!("Capability '{}' is not allowed", step.capability));
        }
        if policy.contain_relative(&step.target).is_err() {
            rejected.push(format!("Target '{}' is outside project root", step.target));
        }
    }

    if !rejected.is_empty() {
        tracing::warn!("plan rejected with {} violation(s)", rejected.len());
    }
    PlanValidationResult::from_rejections(rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanStep;
    use sc_policy::PlannerConfig;
    use tempfile::tempdir;

    fn policy(root: &std::path::Path, max_steps: usize) -> Policy {
        Policy::new(root)
            .with_allowed_capabilities(["todo_scan", "repo_stats"])
            .with_planner(PlannerConfig {
                max_steps,
                ..Default::default()
            })
    }

    #[test]
    fn accepts_contained_allowed_steps() {
        let dir = tempdir().unwrap();
        let plan = ExecutionPlan::new(vec![
            PlanStep::new("todo_scan", "./src"),
            PlanStep::new("repo_stats", "."),
        ]);
        let result = validate(&plan, &policy(dir.path(), 5));
        assert!(result.validated);
        assert!(result.rejected_steps.is_empty());
    }

    #[test]
    fn too_many_steps_is_a_single_rejection() {
        let dir = tempdir().unwrap();
        let plan = ExecutionPlan::new(vec![PlanStep::new("nope", "../../x"); 3]);
        let result = validate(&plan, &policy(dir.path(), 2));
        assert!(!result.validated);
        assert_eq!(result.rejected_steps, vec!["Plan has 3 steps (max 2)"]);
    }

    #[test]
    fn ten_steps_over_a_limit_of_five_is_rejected() {
        let dir = tempdir().unwrap();
        let plan = ExecutionPlan::new(vec![PlanStep::new("todo_scan", "."); 10]);
        let result = validate(&plan, &policy(dir.path(), 5));
        assert!(!result.validated);
        assert_eq!(result.rejected_steps.len(), 1);
        let message = &result.rejected_steps[0];
        assert!(message.contains("10"), "{message}");
        assert!(message.contains("5"), "{message}");
    }

    #[test]
    fn reports_every_violation() {
        let dir = tempdir().unwrap();
        let plan = ExecutionPlan::new(vec![
            PlanStep::new("shell_exec", "."),
            PlanStep::new("todo_scan", "../../etc"),
            PlanStep::new("secrets_scan", "/etc/passwd"),
        ]);
        let result = validate(&plan, &policy(dir.path(), 5));
        assert!(!result.validated);
        assert_eq!(
            result.rejected_steps,
            vec![
                "Capability 'shell_exec' is not allowed",
                "Target '../../etc' is outside project root",
                "Capability 'secrets_scan' is not allowed",
                "Target '/etc/passwd' is outside project root",
            ]
        );
    }

    #[test]
    fn empty_plan_is_valid() {
        let dir = tempdir().unwrap();
        assert!(validate(&ExecutionPlan::default(), &policy(dir.path(), 5)).validated);
    }
}
