//! Task submissions and per-tool decision records.

use ada_abstraction::VotableResponse;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::TaskContext;

/// A unit of work selected by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetails {
    pub agent_id: String,
    /// Falls back to the agent's first skill when absent.
    #[serde(default)]
    pub skill_id: Option<String>,
    /// Restricts the skill's providers to this one.
    #[serde(default)]
    pub provider_id: Option<String>,
    /// Restricts the selected tools to this one.
    #[serde(default)]
    pub tool_id: Option<String>,
    #[serde(default)]
    pub initial_context: Map<String, Value>,
}

impl TaskDetails {
    pub fn new(agent_id: impl Into<String>, skill_id: impl Into<String>) -> Self {
        Self { agent_id: agent_id.into(), skill_id: Some(skill_id.into()), ..Self::default() }
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.initial_context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_provider(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    #[must_use]
    pub fn with_tool(mut self, tool_id: impl Into<String>) -> Self {
        self.tool_id = Some(tool_id.into());
        self
    }

    pub fn context(&self) -> TaskContext {
        TaskContext::new(self.initial_context.clone())
    }
}

/// Decision record of one tool invocation (or one model voter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutput {
    pub tool_id: String,
    pub provider_id: String,
    pub response: Option<VotableResponse>,
    #[serde(default)]
    pub data: Value,
}

impl ToolOutput {
    pub fn new(
        tool_id: impl Into<String>,
        provider_id: impl Into<String>,
        response: Option<VotableResponse>,
        data: Value,
    ) -> Self {
        Self { tool_id: tool_id.into(), provider_id: provider_id.into(), response, data }
    }

    /// `data.summary`, if the tool returned one.
    pub fn summary(&self) -> Option<&str> {
        self.data.get("summary").and_then(Value::as_str).filter(|s| !s.is_empty())
    }
}
