//! Terminal command parsing.

/// Help text listing the accepted commands.
pub const HELP_TEXT: &str =
    "Available commands: run <agent_id> <skill_id>, help, clear, nodes, restore";

/// A parsed terminal line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCommand {
    Run { agent_id: String, skill_id: String },
    Help,
    Clear,
    Nodes,
    Restore,
    Unknown(String),
}

impl TerminalCommand {
    /// Parses a terminal line. Anything unrecognized, including `run` without
    /// both ids, is `Unknown` carrying the original line.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let mut words = trimmed.split_whitespace();
        match (words.next(), words.next(), words.next(), words.next()) {
            (Some("run"), Some(agent), Some(skill), None) => {
                Self::Run { agent_id: agent.to_string(), skill_id: skill.to_string() }
            }
            (Some("help"), None, None, None) => Self::Help,
            (Some("clear"), None, None, None) => Self::Clear,
            (Some("nodes"), None, None, None) => Self::Nodes,
            (Some("restore"), None, None, None) => Self::Restore,
            _ => Self::Unknown(trimmed.to_string()),
        }
    }
}

/// Error message for an unrecognized command.
pub fn unknown_command_message(command: &str) -> String {
    format!("Unknown command: '{command}'. Type 'help' for available commands.")
}
