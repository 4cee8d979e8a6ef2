use std::fmt;

use serde::{Deserialize, Serialize};

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Waiting on predecessors (or reset by rework)
    #[default]
    None,
    /// All predecessors finished, waiting for a resource
    Ready,
    /// At least one resource assigned, work being applied
    Working,
    /// Extra work injected by a delay event
    WorkingAdditionally,
    /// Remaining work exhausted
    Finished,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::None => "NONE",
            TaskState::Ready => "READY",
            TaskState::Working => "WORKING",
            TaskState::WorkingAdditionally => "WORKING_ADDITIONALLY",
            TaskState::Finished => "FINISHED",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceState {
    #[default]
    Free,
    Working,
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceState::Free => f.write_str("FREE"),
            ResourceState::Working => f.write_str("WORKING"),
        }
    }
}
