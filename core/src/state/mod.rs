//! Task and resource state machines.
//!
//! Tasks move NONE → READY → WORKING → (WORKING_ADDITIONALLY) → FINISHED and
//! may be sent back to NONE by rework. Resources flip between FREE and WORKING.

pub mod transitions;
pub mod types;

pub use transitions::{StateTransition, TransitionError};
pub use types::{ResourceState, TaskState};
