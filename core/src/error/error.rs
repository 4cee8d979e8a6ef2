use thiserror::Error;

use super::model::ModelError;
use super::simulation::SimulationError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error("simulation failed: {0}")]
    Simulation(#[from] SimulationError),
    #[error("report failed: {0}")]
    Report(#[from] ReportError),
    #[error("batch failed: {0}")]
    Batch(#[from] BatchError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Failures writing report artifacts. Attributed to a single run.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("worker pool closed unexpectedly")]
    PoolClosed,
    #[error("run {run} worker failed: {message}")]
    Worker { run: usize, message: String },
    #[error("summary sink: {0}")]
    Report(#[from] ReportError),
}
