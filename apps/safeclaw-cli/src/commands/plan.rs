// plan.rs: Generate a plan, validate it, confirm, and execute it.

use std::io::{self, BufRead, Write};

use sc_planner::{validate, ExecutionPlan, PlanStep, Planner, PlannerError};
use sc_plugins::CapabilityRegistry;
use sc_policy::Policy;
use sc_runner::Runner;

/// Raw backend text shown when parsing fails.
const RAW_PREVIEW_CHARS: usize = 500;

/// What to do before executing a validated plan.
#[derive(Debug, PartialEq, Eq)]
pub enum Confirmation {
    /// Ask on stdin.
    Prompt,
    /// Run without asking.
    Proceed,
    /// `--auto` was given but the policy demands confirmation.
    Refuse,
}

pub fn confirmation(require_confirmation: bool, auto: bool) -> Confirmation {
    match (require_confirmation, auto) {
        (true, true) => Confirmation::Refuse,
        (true, false) => Confirmation::Prompt,
        (false, _) => Confirmation::Proceed,
    }
}

/// Whether `step` passes both validator checks on its own.
fn step_allowed(step: &PlanStep, policy: &Policy) -> bool {
    policy.is_capability_allowed(&step.capability) && policy.contain_relative(&step.target).is_ok()
}

fn print_plan(plan: &ExecutionPlan, policy: &Policy) {
    println!("Execution Plan");
    println!(
        "{:<3} {:<16} {:<24} {:<8} REASON",
        "#", "CAPABILITY", "TARGET", "STATUS"
    );
    println!("{}", "-".repeat(80));
    for (index, step) in plan.steps.iter().enumerate() {
        let status = if step_allowed(step, policy) {
            "allowed"
        } else {
            "denied"
        };
        println!(
            "{:<3} {:<16} {:<24} {:<8} {}",
            index + 1,
            step.capability,
            step.target,
            status,
            step.reason
        );
    }
}

fn ask(question: &str) -> io::Result<bool> {
    print!("{} [y/N]: ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

pub fn execute(
    policy: &Policy,
    registry: &CapabilityRegistry,
    task: &str,
    dry_run: bool,
    auto: bool,
) -> anyhow::Result<()> {
    let plan = match Planner::new(policy).plan(task) {
        Ok(plan) => plan,
        Err(PlannerError::Parse(e)) => {
            eprintln!("Failed to parse planner response: {}", e);
            if !e.raw_response.is_empty() {
                let preview: String = e.raw_response.chars().take(RAW_PREVIEW_CHARS).collect();
                eprintln!("Raw response:\n{}", preview);
            }
            anyhow::bail!("planning failed");
        }
        Err(PlannerError::Connection(e)) => anyhow::bail!("Connection error: {}", e),
        Err(e) => return Err(e.into()),
    };

    let validation = validate(&plan, policy);
    print_plan(&plan, policy);
    for message in &validation.rejected_steps {
        println!("  Rejected: {}", message);
    }
    if !validation.validated {
        anyhow::bail!("Plan validation failed. No steps will be executed.");
    }

    if dry_run {
        println!("\nDry run: no steps executed.");
        return Ok(());
    }

    match confirmation(policy.planner.require_confirmation, auto) {
        Confirmation::Refuse => {
            anyhow::bail!("Cannot use --auto when require_confirmation is true in policy.")
        }
        Confirmation::Prompt => {
            if !ask("Execute this plan?")? {
                println!("Aborted.");
                return Ok(());
            }
        }
        Confirmation::Proceed => {}
    }

    println!("\nExecuting plan...\n");
    let results = Runner::new(policy, registry).run_plan(&plan);
    for (index, (step, result)) in plan.steps.iter().zip(&results).enumerate() {
        let mark = if result.ok { "OK" } else { "FAIL" };
        println!("  Step {} ({}): {}", index + 1, step.capability, mark);
        if !result.ok {
            println!("    {}", result.message);
        }
    }

    let completed = results.iter().filter(|r| r.ok).count();
    println!(
        "\n{}/{} step(s) completed successfully.",
        completed,
        plan.steps.len()
    );
    if completed < plan.steps.len() {
        anyhow::bail!("plan stopped after a failed step");
    }
    Ok(())
}
