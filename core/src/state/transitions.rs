//! Legal task state transitions.

use super::types::TaskState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: TaskState, to: TaskState },
}

pub struct StateTransition;

impl StateTransition {
    /// Validate a task state change.
    pub fn validate(from: TaskState, to: TaskState) -> Result<(), TransitionError> {
        let is_valid = match (from, to) {
            (TaskState::None, TaskState::Ready) => true,
            (TaskState::Ready, TaskState::Working) => true,

            // Remaining work exhausted: delay or finish
            (TaskState::Working, TaskState::WorkingAdditionally) => true,
            (TaskState::Working, TaskState::Finished) => true,
            (TaskState::WorkingAdditionally, TaskState::Finished) => true,

            // Rework sends started work back to the beginning
            (TaskState::Working, TaskState::None)
            | (TaskState::WorkingAdditionally, TaskState::None)
            | (TaskState::Finished, TaskState::None) => true,

            // A predecessor was reworked before this task got a resource
            (TaskState::Ready, TaskState::None) => true,

            _ => false,
        };

        if is_valid {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { from, to })
        }
    }

    /// FINISHED is terminal unless rework reopens the task.
    pub fn is_terminal(state: TaskState) -> bool {
        matches!(state, TaskState::Finished)
    }

    /// States in which work is applied each tick.
    pub fn is_active(state: TaskState) -> bool {
        matches!(state, TaskState::Working | TaskState::WorkingAdditionally)
    }

    pub fn describe(state: TaskState) -> &'static str {
        match state {
            TaskState::None => "waiting for predecessors",
            TaskState::Ready => "waiting for a resource",
            TaskState::Working => "in progress",
            TaskState::WorkingAdditionally => "in progress (delayed)",
            TaskState::Finished => "finished",
        }
    }
}
