//! Nodes command implementation.

use anyhow::Context;

use super::Sources;
use crate::render;

pub fn execute(sources: &Sources, json: bool) -> anyhow::Result<()> {
    let node = sources.build_node()?;
    let nodes = node.nodes();

    if json {
        let out = serde_json::to_string_pretty(&nodes).context("Failed to serialize nodes")?;
        println!("{out}");
    } else {
        render::print_nodes(&nodes);
    }
    Ok(())
}
