use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::config::AppConfig;
use crate::report::ReportOptions;
use crate::simulator::{RunSummary, SimulationOpts};

#[derive(Debug, Clone)]
pub struct BatchOpts {
    /// 0 disables the batch.
    pub runs: usize,
    pub base_seed: u64,
    /// Worker pool size (defaults to the number of CPUs)
    pub max_parallel: Option<usize>,
    /// Write run-<n>.csv / run-<n>.log under `output_dir`
    pub write_artifacts: bool,
    /// Also receives summary.csv when set
    pub output_dir: Option<PathBuf>,
    pub progress_bar: bool,
    pub simulation: SimulationOpts,
    pub report: ReportOptions,
}

impl Default for BatchOpts {
    fn default() -> Self {
        Self {
            runs: 0,
            base_seed: 0,
            max_parallel: None,
            write_artifacts: false,
            output_dir: None,
            progress_bar: false,
            simulation: SimulationOpts::default(),
            report: ReportOptions::default(),
        }
    }
}

impl BatchOpts {
    pub fn from_config(cfg: &AppConfig) -> Self {
        let mc = &cfg.monte_carlo;
        Self {
            runs: mc.runs,
            base_seed: mc.base_seed,
            max_parallel: mc.max_parallel,
            write_artifacts: mc.write_artifacts,
            output_dir: mc.output_dir.as_ref().map(PathBuf::from),
            progress_bar: mc.progress_bar,
            simulation: SimulationOpts::from_config(&cfg.simulation),
            report: ReportOptions::from_config(&cfg.report),
        }
    }

    /// Seed of run `index`; run 0 reproduces a single run seeded with `base_seed`.
    pub fn seed_for(&self, index: usize) -> u64 {
        self.base_seed.wrapping_add(index as u64)
    }
}

/// Best-effort stop: runs not yet started are skipped, in-flight runs finish.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed(RunSummary),
    Failed { error: String },
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub run: usize,
    pub seed: u64,
    pub elapsed_ms: u64,
    pub outcome: RunOutcome,
}

impl RunResult {
    pub fn summary(&self) -> Option<&RunSummary> {
        match &self.outcome {
            RunOutcome::Completed(summary) => Some(summary),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub batch_id: String,
    /// False when the batch was disabled (runs = 0)
    pub enabled: bool,
    pub parallelism: usize,
    pub duration_ms: u64,
    /// Sorted by run index
    pub runs: Vec<RunResult>,
}

impl BatchResult {
    pub fn disabled(batch_id: String) -> Self {
        Self {
            batch_id,
            enabled: false,
            parallelism: 0,
            duration_ms: 0,
            runs: Vec::new(),
        }
    }

    pub fn summaries(&self) -> Vec<&RunSummary> {
        self.runs.iter().filter_map(|r| r.summary()).collect()
    }

    pub fn completed(&self) -> usize {
        self.runs.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| matches!(r.outcome, RunOutcome::Failed { .. }))
            .count()
    }

    pub fn cancelled(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| matches!(r.outcome, RunOutcome::Cancelled))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_wraps() {
        let opts = BatchOpts {
            base_seed: u64::MAX,
            ..BatchOpts::default()
        };
        assert_eq!(opts.seed_for(0), u64::MAX);
        assert_eq!(opts.seed_for(1), 0);
    }

    #[test]
    fn test_run_result_serializes_with_status() {
        let result = RunResult {
            run: 2,
            seed: 9,
            elapsed_ms: 1,
            outcome: RunOutcome::Failed {
                error: "boom".to_string(),
            },
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["outcome"]["status"], "failed");
        assert_eq!(value["outcome"]["error"], "boom");
        assert_eq!(value["run"], 2);
    }

    #[test]
    fn test_cancellation_flag_is_shared() {
        let flag = CancellationFlag::new();
        let other = flag.clone();
        other.cancel();
        assert!(flag.is_cancelled());
    }
}
