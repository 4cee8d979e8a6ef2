use thiserror::Error;

use crate::state::TransitionError;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("tick budget of {ticks} exhausted with {unfinished} unfinished task(s)")]
    TickBudgetExceeded { ticks: u32, unfinished: usize },

    #[error("task '{task}': {source}")]
    Transition {
        task: String,
        source: TransitionError,
    },
}
