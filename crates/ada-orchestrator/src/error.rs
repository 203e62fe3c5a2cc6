// Error types for task orchestration

use thiserror::Error;

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;

/// Orchestration errors
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// The requested agent is not in the catalog
    #[error("Agent '{0}' not found.")]
    AgentNotFound(String),

    /// The agent does not offer the requested skill
    #[error("Skill '{skill}' not found for agent '{agent}'.")]
    SkillNotFound {
        /// Agent ID
        agent: String,
        /// Skill ID
        skill: String,
    },

    /// A provider referenced by the task or skill is unknown
    #[error("Provider '{0}' not found.")]
    ProviderNotFound(String),

    /// A tool referenced by the task or provider is unknown
    #[error("Tool '{0}' not found.")]
    ToolNotFound(String),

    /// Another task holds the single task slot
    #[error("Another task is already running.")]
    Busy,

    /// Every delivery attempt of a mesh exchange failed
    #[error("Exchange with '{to}' failed after {attempts} attempt(s).")]
    MeshExhausted {
        /// Destination node
        to: String,
        /// Attempts made
        attempts: u32,
    },

    /// A mesh request was resolved by its timeout
    #[error("Request {request_id} to '{to}' timed out.")]
    Timeout {
        /// Request ID
        request_id: String,
        /// Destination node
        to: String,
    },

    /// Core error
    #[error(transparent)]
    Core(#[from] ada_core::CoreError),

    /// Model error
    #[error("Model error: {0}")]
    Model(#[from] ada_abstraction::ModelError),

    /// Other error
    #[error("Orchestration error: {0}")]
    Other(String),
}

impl OrchestrationError {
    /// Not-found errors fail a task immediately without retry.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AgentNotFound(_)
                | Self::SkillNotFound { .. }
                | Self::ProviderNotFound(_)
                | Self::ToolNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_human_readable() {
        let err = OrchestrationError::SkillNotFound {
            agent: "travel_agent".to_string(),
            skill: "teleport".to_string(),
        };
        assert_eq!(err.to_string(), "Skill 'teleport' not found for agent 'travel_agent'.");
        assert!(err.is_not_found());
        assert!(!OrchestrationError::Busy.is_not_found());
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err: OrchestrationError = ada_core::CoreError::Checkpoint("disk full".into()).into();
        assert_eq!(err.to_string(), "Checkpoint error: disk full");
    }
}
