// Agent framework catalog
//
// Static description of agents, their skills, the providers that can fulfil
// each skill and the tools each provider exposes. Loaded once at startup.

mod builtin;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{CoreError, Result};

/// Leaf capability exposed by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    #[serde(default)]
    pub id: String,
    pub description: String,
}

impl Tool {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self { id: id.into(), description: description.into() }
    }
}

/// A backend that can execute a set of tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    #[serde(default)]
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub supported_tool_ids: Vec<String>,
}

/// A unit of work an agent offers, with its eligible providers in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub provider_ids: Vec<String>,
}

/// Label describing how an agent combines provider answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingStrategy {
    #[default]
    Plurality,
    FirstSuccess,
}

impl fmt::Display for VotingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plurality => write!(f, "plurality"),
            Self::FirstSuccess => write!(f, "first_success"),
        }
    }
}

/// An agent and the skills it offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentModule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub voting_strategy: VotingStrategy,
    #[serde(default)]
    pub red_flagging: bool,
}

impl AgentModule {
    pub fn skill(&self, skill_id: &str) -> Option<&Skill> {
        self.skills.iter().find(|s| s.id == skill_id)
    }
}

/// The whole framework description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub tools: BTreeMap<String, Tool>,
    pub providers: BTreeMap<String, Provider>,
    pub modules: BTreeMap<String, AgentModule>,
}

impl Catalog {
    /// The reference catalog: CRM, travel, maritime and finance agents.
    pub fn builtin() -> Self {
        builtin::catalog()
    }

    /// Parse a catalog from TOML with `tools`, `providers` and `modules` tables.
    ///
    /// Entry ids default to their table keys.
    ///
    /// # Errors
    /// Returns error if the TOML cannot be parsed or references are dangling
    pub fn from_toml_str(toml_content: &str) -> Result<Self> {
        let mut catalog: Self = toml::from_str(toml_content)?;
        for (key, tool) in &mut catalog.tools {
            if tool.id.is_empty() {
                tool.id.clone_from(key);
            }
        }
        for (key, provider) in &mut catalog.providers {
            if provider.id.is_empty() {
                provider.id.clone_from(key);
            }
        }
        for (key, module) in &mut catalog.modules {
            if module.id.is_empty() {
                module.id.clone_from(key);
            }
        }
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Reports the first provider or tool reference that does not resolve.
    ///
    /// # Errors
    /// Returns `CoreError::Catalog` naming the dangling reference
    pub fn validate(&self) -> Result<()> {
        for provider in self.providers.values() {
            if let Some(tool) =
                provider.supported_tool_ids.iter().find(|t| !self.tools.contains_key(*t))
            {
                return Err(CoreError::Catalog(format!(
                    "provider '{}' references unknown tool '{tool}'",
                    provider.id
                )));
            }
        }
        for module in self.modules.values() {
            for skill in &module.skills {
                if let Some(provider) =
                    skill.provider_ids.iter().find(|p| !self.providers.contains_key(*p))
                {
                    return Err(CoreError::Catalog(format!(
                        "skill '{}' of '{}' references unknown provider '{provider}'",
                        skill.id, module.id
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn module(&self, agent_id: &str) -> Option<&AgentModule> {
        self.modules.get(agent_id)
    }

    pub fn skill(&self, agent_id: &str, skill_id: &str) -> Option<&Skill> {
        self.module(agent_id).and_then(|m| m.skill(skill_id))
    }

    pub fn provider(&self, provider_id: &str) -> Option<&Provider> {
        self.providers.get(provider_id)
    }

    pub fn tool(&self, tool_id: &str) -> Option<&Tool> {
        self.tools.get(tool_id)
    }

    /// Agent ids in key order.
    pub fn module_ids(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }
}
