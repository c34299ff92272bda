//! Policy display command

use anyhow::Result;
use guardian_core::{PolicySource, RiskPolicy};

/// Print the effective policy and where it came from
pub fn cmd_policy(policy: &RiskPolicy, source: &PolicySource) -> Result<()> {
    println!("Policy source: {}", source);
    if let Some(path) = guardian_core::policy::default_policy_path() {
        println!("Override path: {}", path.display());
    }
    println!("{}", serde_json::to_string_pretty(policy)?);
    Ok(())
}
