//! # safeclaw
//!
//! Command-line interface for SafeClaw, a policy-gated local dev assistant.
//!
//! Every command loads the policy once, builds the capability registry once,
//! and goes through the runner, so each action is gated and audited:
//! - `safeclaw todo|summarize|secrets|deps|stats`: run one built-in capability
//! - `safeclaw policy`: show the effective policy
//! - `safeclaw audit tail|verify`: inspect the audit ledger
//! - `safeclaw plan <task>`: propose, validate, and run a multi-step plan
//! - `safeclaw dashboard`: localhost web dashboard

mod commands;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sc_plugins::CapabilityRegistry;
use sc_policy::{Policy, DEFAULT_POLICY_FILE};
use tracing_subscriber::EnvFilter;

/// SafeClaw: a sandboxed, policy-driven local dev assistant.
#[derive(Parser)]
#[command(name = "safeclaw", version, about)]
struct Cli {
    /// Path to the policy file.
    #[arg(long, short = 'p', global = true, default_value = DEFAULT_POLICY_FILE)]
    policy: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for TODO / FIXME / HACK markers.
    Todo {
        /// Directory or file to scan.
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Summarise a log file (errors, exceptions, failures).
    Summarize {
        /// Log file to summarise.
        logfile: PathBuf,
    },
    /// Scan for hardcoded secrets and credentials.
    Secrets {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// List declared dependencies and flag risky pins.
    Deps {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Show repository statistics (files, lines, types).
    Stats {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Display the effective policy.
    Policy,
    /// Inspect the audit ledger.
    Audit {
        #[command(subcommand)]
        command: commands::audit::AuditCommands,
    },
    /// Generate, validate, and execute a plan for a task.
    Plan {
        /// Task description for the planner.
        task: String,
        /// Show the plan without executing it.
        #[arg(long)]
        dry_run: bool,
        /// Skip the confirmation prompt.
        #[arg(long)]
        auto: bool,
    },
    /// Start the localhost web dashboard.
    Dashboard {
        /// Port to bind (defaults to dashboard.port in the policy).
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,safeclaw=info,sc_runner=info,sc_planner=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let policy = Policy::load(&cli.policy)
        .with_context(|| format!("cannot load policy from {}", cli.policy.display()))?;
    let registry = CapabilityRegistry::builtin();

    match &cli.command {
        Commands::Todo { path } => commands::run::execute(&policy, &registry, "todo_scan", path),
        Commands::Summarize { logfile } => {
            commands::run::execute(&policy, &registry, "log_summarize", logfile)
        }
        Commands::Secrets { path } => {
            commands::run::execute(&policy, &registry, "secrets_scan", path)
        }
        Commands::Deps { path } => commands::run::execute(&policy, &registry, "deps_audit", path),
        Commands::Stats { path } => commands::run::execute(&policy, &registry, "repo_stats", path),
        Commands::Policy => commands::policy::execute(&policy),
        Commands::Audit { command } => commands::audit::execute(command, &policy),
        Commands::Plan {
            task,
            dry_run,
            auto,
        } => commands::plan::execute(&policy, &registry, task, *dry_run, *auto),
        Commands::Dashboard { port } => commands::dashboard::execute(policy, registry, *port),
    }
}
