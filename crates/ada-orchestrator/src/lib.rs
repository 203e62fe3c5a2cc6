//! Ada Node orchestration.
//!
//! Plans a workflow for a task, simulates the mesh exchanges between nodes,
//! invokes the selected tools, optionally votes over their decisions and
//! seals the result into a checkpoint. [`AdaNode`] is the entry point for
//! presentation layers.

pub mod command;
pub mod connections;
pub mod context;
pub mod error;
pub mod executor;
pub mod generative;
pub mod lifecycle;
pub mod mesh;
pub mod metrics;
pub mod planner;
pub mod runtime;
pub mod simulation;
pub mod slot;
pub mod task;
pub mod voting;

pub use command::{HELP_TEXT, TerminalCommand};
pub use context::TaskContext;
pub use error::{OrchestrationError, Result};
pub use executor::{ExecutorParts, MCP_SOURCE, TaskExecutor, TaskReport};
pub use generative::GenerativeService;
pub use lifecycle::TaskState;
pub use metrics::SystemMetrics;
pub use planner::WorkflowPlan;
pub use runtime::{AdaNode, AdaNodeBuilder, CommandOutcome, RestoreOutcome};
pub use simulation::{CustomerDirectory, ProviderBackend, SimulatedCrm, SimulatedProviders, SimulationResult};
pub use task::{TaskDetails, ToolOutput};
pub use voting::{MajorityVote, VoteOutcome};
