use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use pdes_core::simulator::AllocationPolicy;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyArg {
    Collaborative,
    SingleResource,
    MultiTask,
}

impl From<PolicyArg> for AllocationPolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Collaborative => AllocationPolicy::Collaborative,
            PolicyArg::SingleResource => AllocationPolicy::SingleResource,
            PolicyArg::MultiTask => AllocationPolicy::MultiTask,
        }
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Jsonl,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Jsonl => "jsonl",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "pdes", version, about = "Project schedule simulator")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ~/.pdes/config.toml, then ./pdes.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Project model file (.json or .toml)
    #[arg(long)]
    pub model: PathBuf,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Fail the run after this many ticks
    #[arg(long)]
    pub max_ticks: Option<u32>,

    /// Write run-0.csv (Gantt) and run-0.log (event log) here
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct BatchArgs {
    #[arg(long)]
    pub model: PathBuf,

    /// Number of runs; 0 falls back to a single run
    #[arg(long)]
    pub runs: Option<usize>,

    #[arg(long)]
    pub base_seed: Option<u64>,

    #[arg(long)]
    pub max_parallel: Option<usize>,

    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    #[arg(long)]
    pub max_ticks: Option<u32>,

    /// Receives summary.csv, plus per-run artifacts with --write-artifacts
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub write_artifacts: bool,

    /// Batch event and report format (overrides report.output_format)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long)]
    pub model: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Simulate the project once
    Run(RunArgs),
    /// Monte Carlo batch of independent seeded runs
    Batch(BatchArgs),
    /// Build the model and print its stages and static critical path
    Validate(ValidateArgs),
}
