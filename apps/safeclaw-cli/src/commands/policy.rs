// policy.rs: Show the effective policy.

use sc_policy::Policy;

fn allowed(flag: bool) -> &'static str {
    if flag {
        "allowed"
    } else {
        "denied"
    }
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "enabled"
    } else {
        "disabled"
    }
}

/// Setting/value rows in display order.
pub fn summary_rows(policy: &Policy) -> Vec<(&'static str, String)> {
    let capabilities: Vec<&str> = policy.allowed_capabilities.iter().collect();
    let capabilities = if capabilities.is_empty() {
        "(none)".to_string()
    } else {
        capabilities.join(", ")
    };

    vec![
        ("Project root", policy.resolved_root().display().to_string()),
        ("Sandbox subdir", policy.sandbox_subdir.clone()),
        ("Network access", allowed(policy.allow_network).to_string()),
        ("Shell access", allowed(policy.allow_shell).to_string()),
        ("Allowed plugins", capabilities),
        ("Max file size", format!("{} MB", policy.limits.max_file_mb)),
        ("Max files", policy.limits.max_files.to_string()),
        ("Timeout", format!("{}s", policy.limits.timeout_seconds)),
        (
            "Planner",
            format!(
                "{} ({}, {})",
                enabled(policy.planner.enabled),
                policy.planner.backend,
                policy.planner.model
            ),
        ),
        (
            "Dashboard",
            format!(
                "{} ({}:{})",
                enabled(policy.dashboard.enabled),
                policy.dashboard.host,
                policy.dashboard.port
            ),
        ),
    ]
}

pub fn execute(policy: &Policy) -> anyhow::Result<()> {
    println!("SafeClaw Policy");
    println!("{}", "-".repeat(60));
    for (setting, value) in summary_rows(policy) {
        println!("{:<18} {}", setting, value);
    }
    Ok(())
}
