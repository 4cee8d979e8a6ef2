use serde::{Deserialize, Serialize};

use crate::simulator::AllocationPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or ~/.pdes/logs if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "pdes_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub allocation_policy: AllocationPolicy,

    /// Abort a run after this many ticks. `None` runs until every task finishes.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: Option<u32>,

    /// Seed of the single deterministic run.
    #[serde(default)]
    pub seed: u64,

    /// Reject probability tables whose entries are not in ascending order.
    /// When false they are sorted instead.
    #[serde(default = "default_strict_probability_order")]
    pub strict_probability_order: bool,
}

fn default_max_ticks() -> Option<u32> {
    Some(100_000)
}

fn default_strict_probability_order() -> bool {
    true
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            allocation_policy: AllocationPolicy::default(),
            max_ticks: default_max_ticks(),
            seed: 0,
            strict_probability_order: default_strict_probability_order(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    /// Number of runs; 0 disables the batch and a single run is made instead.
    #[serde(default)]
    pub runs: usize,

    #[serde(default)]
    pub base_seed: u64,

    /// Worker pool size. Defaults to the number of CPUs.
    #[serde(default)]
    pub max_parallel: Option<usize>,

    /// Write a Gantt CSV and event log per run.
    #[serde(default)]
    pub write_artifacts: bool,

    #[serde(default)]
    pub output_dir: Option<String>,

    #[serde(default = "default_progress_bar")]
    pub progress_bar: bool,
}

fn default_progress_bar() -> bool {
    true
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            runs: 0,
            base_seed: 0,
            max_parallel: None,
            write_artifacts: false,
            output_dir: None,
            progress_bar: default_progress_bar(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Ticks per reported time unit.
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,

    /// Prefix CSV artifacts with a UTF-8 byte order mark.
    #[serde(default = "default_utf8_bom")]
    pub utf8_bom: bool,

    /// "text" or "jsonl"
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

fn default_time_scale() -> f64 {
    1.0
}

fn default_utf8_bom() -> bool {
    true
}

fn default_output_format() -> String {
    "text".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            time_scale: default_time_scale(),
            utf8_bom: default_utf8_bom(),
            output_format: default_output_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    #[serde(default = "default_concurrency_strategy")]
    pub strategy: String,
    #[serde(default = "default_min_concurrency")]
    pub min_concurrency: usize,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// 0 means "number of CPUs".
    #[serde(default)]
    pub base_concurrency: usize,
    #[serde(default = "default_cpu_threshold_low")]
    pub cpu_threshold_low: f32,
    #[serde(default = "default_cpu_threshold_high")]
    pub cpu_threshold_high: f32,
}

fn default_concurrency_strategy() -> String {
    "fixed".to_string()
}

fn default_min_concurrency() -> usize {
    1
}

fn default_max_concurrency() -> usize {
    64
}

fn default_cpu_threshold_low() -> f32 {
    50.0
}

fn default_cpu_threshold_high() -> f32 {
    80.0
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            strategy: default_concurrency_strategy(),
            min_concurrency: default_min_concurrency(),
            max_concurrency: default_max_concurrency(),
            base_concurrency: 0,
            cpu_threshold_low: default_cpu_threshold_low(),
            cpu_threshold_high: default_cpu_threshold_high(),
        }
    }
}
