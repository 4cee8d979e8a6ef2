use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;

use super::allocation::AllocationPolicy;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationOpts {
    pub policy: AllocationPolicy,
    /// Fail the run once this many ticks pass without every task finishing.
    pub max_ticks: Option<u32>,
    pub seed: u64,
}

impl Default for SimulationOpts {
    fn default() -> Self {
        Self {
            policy: AllocationPolicy::default(),
            max_ticks: Some(100_000),
            seed: 0,
        }
    }
}

impl SimulationOpts {
    pub fn from_config(cfg: &SimulationConfig) -> Self {
        Self {
            policy: cfg.allocation_policy,
            max_ticks: cfg.max_ticks,
            seed: cfg.seed,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Per-run scalar summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run: usize,
    pub seed: u64,
    pub duration: u32,
    pub cost: f64,
    pub total_work: f64,
    pub ticks: u32,
}

impl RunSummary {
    /// `run,cost,duration,total_work`
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{:.6},{},{:.6}",
            self.run, self.cost, self.duration, self.total_work
        )
    }
}
