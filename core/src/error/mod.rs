#[allow(clippy::module_inception)]
pub mod error;
pub mod model;
pub mod simulation;

pub use error::{BatchError, CliError, ReportError};
pub use model::ModelError;
pub use simulation::SimulationError;
