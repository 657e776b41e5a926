// audit.rs: Audit subcommands: tail, verify.

use clap::Subcommand;
use sc_audit::{AuditError, AuditEvent, AuditLedger};
use sc_policy::Policy;

/// Detail column width in `audit tail`.
const DETAIL_WIDTH: usize = 60;

#[derive(Subcommand)]
pub enum AuditCommands {
    /// Show recent audit records, newest first.
    Tail {
        /// Number of records to show.
        #[arg(short, default_value = "20")]
        n: usize,
    },
    /// Verify the ledger's hash chain.
    Verify,
}

pub fn execute(cmd: &AuditCommands, policy: &Policy) -> anyhow::Result<()> {
    let ledger = AuditLedger::for_project(policy.resolved_root());

    match cmd {
        AuditCommands::Tail { n } => {
            let events = ledger.read_recent(*n)?;
            if events.is_empty() {
                println!("No audit log entries found.");
                return Ok(());
            }

            println!(
                "{:<20} {:<16} {:<8} DETAIL",
                "TIMESTAMP", "ACTION", "STATUS"
            );
            println!("{}", "-".repeat(100));
            for event in &events {
                println!("{}", format_row(event));
            }
        }

        AuditCommands::Verify => {
            if !ledger.path().exists() {
                println!("No audit log found at {}", ledger.path().display());
                return Ok(());
            }

            match ledger.verify_chain() {
                Ok(count) => {
                    println!("Audit log verified: {} record(s), hash chain intact.", count);
                }
                Err(AuditError::IntegrityViolation {
                    line,
                    expected,
                    actual,
                }) => {
                    println!("INTEGRITY VIOLATION at line {}:", line);
                    println!("  Expected previous_hash: {}", expected);
                    println!("  Actual previous_hash:   {}", actual);
                    println!();
                    println!("The audit log may have been tampered with.");
                    anyhow::bail!("Audit log integrity check failed");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}

fn format_row(event: &AuditEvent) -> String {
    let detail = event.detail.replace('\n', " ");
    format!(
        "{:<20} {:<16} {:<8} {}",
        event.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        event.action,
        event.status.to_string(),
        truncate(&detail, DETAIL_WIDTH)
    )
}

/// First `max` characters of `s`, with an ellipsis when cut.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(max.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}
