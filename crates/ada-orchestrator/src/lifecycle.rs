//! Task lifecycle: `idle -> running -> (succeeded | failed)`.
//!
//! `running` is further divided by the index of the current plan step.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, error};

/// Task execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// No task has run yet.
    Idle,
    /// A task is executing.
    Running,
    /// The last task completed.
    Succeeded,
    /// The last task failed or was rejected by consensus.
    Failed,
}

impl TaskState {
    /// Checks if the lifecycle can move to the given state.
    #[must_use]
    pub fn can_transition_to(&self, to: Self) -> bool {
        match (self, to) {
            (Self::Idle | Self::Succeeded | Self::Failed, Self::Running) => true,
            (Self::Running, Self::Succeeded | Self::Failed) => true,
            (a, b) if *a == b => true,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    state: TaskState,
    step: Option<usize>,
}

/// Tracks the state of the (single) running task.
pub struct TaskLifecycle {
    current: Mutex<Snapshot>,
}

impl fmt::Debug for TaskLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskLifecycle")
            .field("state", &self.state())
            .field("step", &self.step())
            .finish()
    }
}

impl Default for TaskLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskLifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self { current: Mutex::new(Snapshot { state: TaskState::Idle, step: None }) }
    }

    pub fn state(&self) -> TaskState {
        self.lock().state
    }

    /// Index of the plan step being executed while running.
    pub fn step(&self) -> Option<usize> {
        self.lock().step
    }

    /// Moves to `to`.
    ///
    /// # Errors
    /// Returns the current state if the transition is invalid.
    pub fn transition(&self, to: TaskState) -> Result<TaskState, TaskState> {
        let mut current = self.lock();
        let from = current.state;
        if !from.can_transition_to(to) {
            error!(from = %from, to = %to, "Invalid task state transition");
            return Err(from);
        }
        debug!(from = %from, to = %to, "Task state transition");
        current.state = to;
        current.step = None;
        Ok(from)
    }

    /// Records the current plan step; ignored unless running.
    pub fn enter_step(&self, index: usize) {
        let mut current = self.lock();
        if current.state == TaskState::Running {
            current.step = Some(index);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Snapshot> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(TaskState::Idle.can_transition_to(TaskState::Running));
        assert!(TaskState::Running.can_transition_to(TaskState::Succeeded));
        assert!(TaskState::Running.can_transition_to(TaskState::Failed));
        assert!(TaskState::Failed.can_transition_to(TaskState::Running));
        assert!(TaskState::Succeeded.can_transition_to(TaskState::Running));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!TaskState::Idle.can_transition_to(TaskState::Succeeded));
        assert!(!TaskState::Succeeded.can_transition_to(TaskState::Failed));
        assert!(!TaskState::Running.can_transition_to(TaskState::Idle));
    }

    #[test]
    fn test_steps_only_tracked_while_running() {
        let lifecycle = TaskLifecycle::new();
        lifecycle.enter_step(0);
        assert_eq!(lifecycle.step(), None);

        assert_eq!(lifecycle.transition(TaskState::Running), Ok(TaskState::Idle));
        lifecycle.enter_step(1);
        assert_eq!(lifecycle.step(), Some(1));

        lifecycle.transition(TaskState::Succeeded).unwrap();
        assert_eq!(lifecycle.step(), None);
        assert!(lifecycle.state().is_terminal());
        assert_eq!(lifecycle.transition(TaskState::Idle), Err(TaskState::Succeeded));
    }

    #[test]
    fn test_back_to_back_tasks_only_use_legal_moves() {
        let lifecycle = TaskLifecycle::new();
        for end in [TaskState::Succeeded, TaskState::Failed, TaskState::Succeeded] {
            assert!(lifecycle.transition(TaskState::Running).is_ok());
            assert!(lifecycle.transition(end).is_ok());
        }
        assert_eq!(lifecycle.transition(TaskState::Idle), Err(TaskState::Succeeded));
    }
}
