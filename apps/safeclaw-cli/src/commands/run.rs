// run.rs: Single-capability commands (todo, summarize, secrets, deps, stats).

use std::path::Path;

use sc_plugins::CapabilityRegistry;
use sc_policy::Policy;
use sc_runner::Runner;

pub fn execute(
    policy: &Policy,
    registry: &CapabilityRegistry,
    capability: &str,
    target: &Path,
) -> anyhow::Result<()> {
    let result = Runner::new(policy, registry).run(capability, target);

    println!("== {} ==", capability);
    println!("{}", result.message);

    if !result.ok {
        anyhow::bail!("{} did not complete", capability);
    }
    Ok(())
}
