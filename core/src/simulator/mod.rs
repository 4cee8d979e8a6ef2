//! Single-run time-stepping loop.
//!
//! Each tick runs a fixed pipeline over the owned [`ProjectModel`]:
//! allocate → start → perform (+ rework) → finish/delay → ready → PERT.
//!
//! [`ProjectModel`]: crate::model::ProjectModel

mod allocation;
mod engine;
mod types;

pub use allocation::{allocate, prioritized_resources, prioritized_tasks, AllocationPolicy, Assignment};
pub use engine::Simulator;
pub use types::{RunSummary, SimulationOpts};
