//! Ada Node Core - shared state and configuration for the coordination demo.
//!
//! This crate provides:
//! - Configuration (`AdaConfig`) and the agent framework catalog
//! - The node registry and the bounded activity log
//! - Checkpoint storage
//! - Injectable clock and random sources
//! - The event bus consumed by presentation layers

pub mod catalog;
pub mod checkpoint;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod logs;
pub mod nodes;
pub mod random;

pub use catalog::{AgentModule, Catalog, Provider, Skill, Tool, VotingStrategy};
pub use checkpoint::{CheckpointStore, InMemoryCheckpointStore, JsonFileCheckpointStore, Snapshot};
pub use clock::{Clock, ManualClock, TokioClock};
pub use config::AdaConfig;
pub use error::{CoreError, Result};
pub use events::{AdaEvent, EventBus};
pub use logs::{Direction, LogBook, LogEntry, LogFilter, LogRecord, LogType};
pub use nodes::{CENTRAL_NODE_ID, Node, NodeRegistry, NodeStatus};
pub use random::{RandomSource, SeededRandom, SequenceRandom};
