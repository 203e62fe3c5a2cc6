//! Run command implementation.

use ada_orchestrator::TaskDetails;
use ada_orchestrator::context::CUSTOMER_NAME_KEY;
use anyhow::{Context, bail};

use super::Sources;
use crate::render;

/// Arguments of `ada run`.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub agent: String,
    pub skill: Option<String>,
    pub provider: Option<String>,
    pub tool: Option<String>,
    pub customer: Option<String>,
    /// Overrides `voting.enabled` when set.
    pub voting: Option<bool>,
    pub json: bool,
}

impl RunRequest {
    fn details(&self) -> TaskDetails {
        let mut details = TaskDetails {
            agent_id: self.agent.clone(),
            skill_id: self.skill.clone(),
            provider_id: self.provider.clone(),
            tool_id: self.tool.clone(),
            ..TaskDetails::default()
        };
        if let Some(customer) = &self.customer {
            details = details.with_context(CUSTOMER_NAME_KEY, customer.as_str());
        }
        details
    }
}

/// Execute the run command.
///
/// Fails with a non-zero exit when the task does not succeed.
pub async fn execute(sources: &Sources, request: RunRequest) -> anyhow::Result<()> {
    let node = sources.build_node()?;
    let voting = request.voting.unwrap_or(node.config().voting.enabled);

    let report = node.execute(request.details(), voting).await?;

    if request.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    } else {
        render::print_entries(&node.logs());
        render::print_report(&report);
    }

    if !report.succeeded() {
        bail!("Task failed: {}", report.error.as_deref().unwrap_or("unknown error"));
    }
    Ok(())
}
