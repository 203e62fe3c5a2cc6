//! Restore command implementation.

use ada_orchestrator::RestoreOutcome;
use anyhow::bail;

use super::Sources;
use crate::render;

/// Loads the checkpoint named by `general.checkpoint_path` and prints the
/// restored state.
pub async fn execute(sources: &Sources) -> anyhow::Result<()> {
    let node = sources.build_node()?;
    if node.config().general.checkpoint_path.is_none() {
        bail!("No checkpoint file configured; set general.checkpoint_path");
    }

    match node.restore_checkpoint().await {
        RestoreOutcome::Restored => {
            render::print_nodes(&node.nodes());
            render::print_entries(&node.logs());
            Ok(())
        }
        RestoreOutcome::Missing => {
            render::print_entries(&node.logs());
            Ok(())
        }
        RestoreOutcome::Failed => bail!("Failed to load checkpoint."),
    }
}
