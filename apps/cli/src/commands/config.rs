//! Config command implementation.

use anyhow::Context;

use super::Sources;

/// Prints the effective configuration, defaults filled in.
pub fn execute(sources: &Sources) -> anyhow::Result<()> {
    let config = sources.load_config()?;
    let toml = config.to_toml_string().context("Failed to render configuration")?;
    print!("{toml}");
    Ok(())
}
