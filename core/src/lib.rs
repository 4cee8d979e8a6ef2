//! pdes-core: discrete-event simulation of project schedules.
//!
//! A [`model::ProjectModel`] is built once from a plain [`model::ProjectSpec`],
//! driven to completion by a [`simulator::Simulator`], and replicated across
//! many seeded runs by the [`montecarlo::MonteCarloDriver`].
//!
//! ```text
//! ProjectSpec (json / toml)
//!   ↓
//! ProjectModel::from_spec()  → validation, TaskGraph topological order
//!   ↓
//! Simulator::execute()       → allocate → perform → finish/delay → ready → PERT
//!   ↓
//! report::{gantt, event_log} → per-run artifacts
//!   ↓
//! MonteCarloDriver::run()    → BatchResult → report::summary
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod montecarlo;
pub mod report;
pub mod simulator;
pub mod state;
