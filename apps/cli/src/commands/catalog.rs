//! Catalog command implementation.

use anyhow::Context;
use tabled::{Table, Tabled};

use super::Sources;

#[derive(Tabled)]
struct SkillRow {
    agent: String,
    skill: String,
    strategy: String,
    providers: String,
    tools: String,
}

/// Lists every agent skill with its providers and their tools.
pub fn execute(sources: &Sources, json: bool) -> anyhow::Result<()> {
    let catalog = sources.load_catalog()?;

    if json {
        let out = serde_json::to_string_pretty(&catalog).context("Failed to serialize catalog")?;
        println!("{out}");
        return Ok(());
    }

    let mut rows = Vec::new();
    for module in catalog.modules.values() {
        for skill in &module.skills {
            let mut tools: Vec<&str> = Vec::new();
            for provider_id in &skill.provider_ids {
                if let Some(provider) = catalog.provider(provider_id) {
                    for tool in &provider.supported_tool_ids {
                        if !tools.contains(&tool.as_str()) {
                            tools.push(tool);
                        }
                    }
                }
            }
            rows.push(SkillRow {
                agent: module.id.clone(),
                skill: skill.id.clone(),
                strategy: module.voting_strategy.to_string(),
                providers: skill.provider_ids.join(", "),
                tools: tools.join(", "),
            });
        }
    }

    println!("{}", Table::new(rows));
    Ok(())
}
