// runner.rs: The only path from a capability name to its execution.
//
// Gates run in a fixed order: allow-list, registry, path containment. A call
// that fails a gate never reaches the capability. Whatever happens, exactly
// one audit record is appended per call.
//
// Capabilities run on a worker thread so the runner can stop waiting after
// `limits.timeout_seconds` and can turn a panic into an ordinary failure.
// A timed-out worker is abandoned, not killed; it finishes in the
// background and its result is dropped.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sc_audit::{AuditEvent, AuditLedger, AuditStatus};
use sc_planner::ExecutionPlan;
use sc_plugins::{Capability, CapabilityOutput, CapabilityRegistry};
use sc_policy::Policy;
use serde::Serialize;

use crate::error::RunFailure;

/// Outcome of one gated call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub ok: bool,
    pub message: String,
    pub touched_files: Vec<PathBuf>,
    /// Which gate or stage rejected the call, when `ok` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<RunFailure>,
}

impl RunResult {
    fn success(output: CapabilityOutput) -> Self {
        Self {
            ok: true,
            message: output.message,
            touched_files: output.touched_files,
            failure: None,
        }
    }

    fn failed(failure: RunFailure) -> Self {
        Self {
            ok: false,
            message: failure.to_string(),
            touched_files: Vec::new(),
            failure: Some(failure),
        }
    }
}

/// Executes capabilities on behalf of callers, enforcing the policy.
pub struct Runner<'a> {
    policy: &'a Policy,
    registry: &'a CapabilityRegistry,
    ledger: AuditLedger,
}

impl<'a> Runner<'a> {
    pub fn new(policy: &'a Policy, registry: &'a CapabilityRegistry) -> Self {
        Self {
            policy,
            registry,
            ledger: AuditLedger::for_project(policy.resolved_root()),
        }
    }

    pub fn policy(&self) -> &Policy {
        self.policy
    }

    /// Run capability `name` against `target`.
    ///
    /// Relative targets resolve against the process working directory.
    pub fn run(&self, name: &str, target: impl AsRef<Path>) -> RunResult {
        let result = match self.gate(name, target.as_ref()) {
            Ok((capability, resolved)) => match self.invoke(name, capability, resolved) {
                Ok(output) => {
                    tracing::info!(
                        "capability '{}' completed ({} file(s))",
                        name,
                        output.touched_files.len()
                    );
                    RunResult::success(output)
                }
                Err(failure) => {
                    tracing::warn!("{}", failure);
                    RunResult::failed(failure)
                }
            },
            Err(failure) => {
                tracing::warn!("{}", failure);
                RunResult::failed(failure)
            }
        };
        self.record(name, result)
    }

    /// Run each step of a validated plan in order. Targets are relative to
    /// the project root. Stops after the first failing step, so the returned
    /// list is shorter than the plan when something failed.
    pub fn run_plan(&self, plan: &ExecutionPlan) -> Vec<RunResult> {
        let root = self.policy.resolved_root();
        let mut results = Vec::with_capacity(plan.steps.len());
        for (index, step) in plan.steps.iter().enumerate() {
            tracing::debug!(
                "plan step {}/{}: {} {}",
                index + 1,
                plan.steps.len(),
                step.capability,
                step.target
            );
            let result = self.run(&step.capability, root.join(&step.target));
            let ok = result.ok;
            results.push(result);
            if !ok {
                tracing::warn!("plan stopped at step {}", index + 1);
                break;
            }
        }
        results
    }

    fn gate(&self, name: &str, target: &Path) -> Result<(Arc<dyn Capability>, PathBuf), RunFailure> {
        if !self.policy.is_capability_allowed(name) {
            return Err(RunFailure::Denied {
                capability: name.to_string(),
            });
        }
        let capability = self
            .registry
            .lookup(name)
            .ok_or_else(|| RunFailure::NotRegistered {
                capability: name.to_string(),
            })?;
        let resolved = self
            .policy
            .contain(target)
            .map_err(|resolved| RunFailure::OutsideRoot {
                target: resolved,
                root: self.policy.resolved_root(),
            })?;
        tracing::debug!("capability '{}' cleared gates for {}", name, resolved.display());
        Ok((capability, resolved))
    }

    fn invoke(
        &self,
        name: &str,
        capability: Arc<dyn Capability>,
        target: PathBuf,
    ) -> Result<CapabilityOutput, RunFailure> {
        let execution_failed = |reason: String| RunFailure::Execution {
            capability: name.to_string(),
            reason,
        };

        let policy = self.policy.clone();
        let seconds = policy.limits.timeout_seconds;
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name(format!("capability-{name}"))
            .spawn(move || {
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| capability.execute(&policy, &target)));
                // The receiver is gone when the call already timed out.
                let _ = tx.send(outcome);
            })
            .map_err(|e| execution_failed(format!("could not start worker: {e}")))?;

        let received = if seconds == 0 {
            rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
        } else {
            rx.recv_timeout(Duration::from_secs(seconds))
        };

        match received {
            Ok(Ok(Ok(output))) => Ok(output),
            Ok(Ok(Err(e))) => Err(execution_failed(e.to_string())),
            Ok(Err(payload)) => Err(execution_failed(panic_message(payload.as_ref()))),
            Err(RecvTimeoutError::Timeout) => Err(RunFailure::Timeout {
                capability: name.to_string(),
                seconds,
            }),
            Err(RecvTimeoutError::Disconnected) => {
                Err(execution_failed("worker exited without a result".into()))
            }
        }
    }

    /// Append the single audit record for a call. If the ledger cannot be
    /// written the call is reported as failed.
    fn record(&self, name: &str, result: RunResult) -> RunResult {
        let status = match &result.failure {
            None => AuditStatus::Ok,
            Some(failure) => failure.audit_status(),
        };
        let event = AuditEvent::new(name, status)
            .with_detail(result.message.as_str())
            .with_touched_files(&result.touched_files);

        match self.ledger.append(event) {
            Ok(()) => result,
            Err(e) => {
                tracing::error!("could not record '{}' in the audit ledger: {}", name, e);
                RunResult {
                    touched_files: result.touched_files,
                    ..RunResult::failed(RunFailure::AuditUnavailable {
                        reason: e.to_string(),
                    })
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
