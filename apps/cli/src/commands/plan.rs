//! Plan command implementation.

use ada_orchestrator::planner;
use anyhow::bail;
use colored::Colorize;

use super::Sources;

/// Prints the steps a task for `agent`/`skill` would visit.
pub fn execute(sources: &Sources, agent: &str, skill: &str) -> anyhow::Result<()> {
    let catalog = sources.load_catalog()?;
    let Some(module) = catalog.module(agent) else {
        bail!("Agent '{agent}' not found.");
    };
    if module.skill(skill).is_none() {
        bail!("Skill '{skill}' not found for agent '{agent}'.");
    }

    let plan = planner::plan(agent, skill);
    println!("{} {}", "Workflow Plan:".bold(), plan);
    for (index, step) in plan.steps.iter().enumerate() {
        let role = if step == agent { "primary" } else { "support" };
        println!("  {}. {} ({})", index + 1, step.cyan(), role.dimmed());
    }
    Ok(())
}
