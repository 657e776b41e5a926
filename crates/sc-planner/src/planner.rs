// planner.rs: Turn a natural-language task into a proposed plan.
//
// The planner only proposes. It never executes anything: callers validate
// the returned plan with `validate` and hand it to the runner. Every call
// that reaches a backend is preceded by a `planner/request` audit record and
// followed by `planner/ok` or `planner/error`.

use sc_audit::{AuditEvent, AuditLedger, AuditStatus};
use sc_policy::Policy;

use crate::backend::{self, ChatBackend};
use crate::error::PlannerError;
use crate::plan::{parse_plan, ExecutionPlan};

/// Audit action name for planner records.
pub const PLANNER_ACTION: &str = "planner";

pub struct Planner<'a> {
    policy: &'a Policy,
    backend: Box<dyn ChatBackend>,
    ledger: AuditLedger,
}

impl<'a> Planner<'a> {
    /// A planner using the backend named in `policy.planner`.
    pub fn new(policy: &'a Policy) -> Self {
        Self {
            policy,
            backend: backend::for_config(&policy.planner),
            ledger: AuditLedger::for_project(policy.resolved_root()),
        }
    }

    /// Replace the backend (builder style).
    pub fn with_backend(mut self, backend: Box<dyn ChatBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Refuse to run when the planner is disabled, or when network access is
    /// denied and the backend is not on this machine.
    pub fn check_enabled(&self) -> Result<(), PlannerError> {
        if !self.policy.planner.enabled {
            return Err(PlannerError::Disabled);
        }
        let endpoint = self.backend.endpoint();
        if !self.policy.allow_network && !backend::is_loopback(endpoint) {
            return Err(PlannerError::NetworkDenied {
                endpoint: endpoint.to_string(),
            });
        }
        Ok(())
    }

    pub fn system_prompt(&self) -> String {
        let capabilities: Vec<&str> = self.policy.allowed_capabilities.iter().collect();
        format!(
            "You are SafeClaw's planning assistant. Your job is to turn a user's task \
description into a JSON execution plan.

Available capabilities: {capabilities}

Policy constraints:
- Project root: {root}
- Network allowed: {network}
- Shell allowed: {shell}
- Max steps per plan: {max_steps}

Respond with ONLY valid JSON. No markdown fences, no explanation, no extra text. \
Use this exact format:

{{\"steps\": [{{\"capability\": \"capability_name\", \"target\": \"./path\", \"reason\": \"why\"}}]}}

Rules:
- Only use capabilities from the available list above.
- Target paths must be relative to the project root.
- Use the fewest steps necessary.
- If no capability is relevant, return {{\"steps\": []}}.
",
            capabilities = capabilities.join(", "),
            root = self.policy.project_root.display(),
            network = self.policy.allow_network,
            shell = self.policy.allow_shell,
            max_steps = self.policy.planner.max_steps,
        )
    }

    /// Ask the backend for a plan for `task`.
    ///
    /// The returned plan has not been validated.
    pub fn plan(&self, task: &str) -> Result<ExecutionPlan, PlannerError> {
        self.check_enabled()?;
        let system = self.system_prompt();

        self.ledger.append(
            AuditEvent::new(PLANNER_ACTION, AuditStatus::Request).with_detail(format!("Task: {task}")),
        )?;
        tracing::info!("requesting plan from {}", self.backend.name());

        let plan = match self
            .backend
            .complete(&system, task)
            .and_then(|raw| parse_plan(&raw).map_err(PlannerError::from))
        {
            Ok(plan) => plan,
            Err(e) => {
                self.record_failure(&e);
                return Err(e);
            }
        };

        self.ledger.append(
            AuditEvent::new(PLANNER_ACTION, AuditStatus::Ok)
                .with_detail(format!("Generated {} step(s)", plan.len())),
        )?;
        Ok(plan)
    }

    fn record_failure(&self, error: &PlannerError) {
        tracing::warn!("planner failed: {}", error);
        let event = AuditEvent::new(PLANNER_ACTION, AuditStatus::Error).with_detail(error.to_string());
        if let Err(e) = self.ledger.append(event) {
            tracing::error!("could not record planner failure: {}", e);
        }
    }
}
