use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ReportError;
use crate::montecarlo::{BatchResult, RunOutcome};

use super::fmt_num;

pub const SUMMARY_HEADER: &str = "run,cost,duration,total_work";

/// Spread of one metric across the completed runs of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p90: f64,
}

impl Stats {
    /// `None` for an empty sample. Population standard deviation,
    /// nearest-rank percentiles.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            p50: percentile(&sorted, 50.0),
            p90: percentile(&sorted, 90.0),
        })
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

#[derive(Debug, Clone, Serialize)]
pub struct RunFailure {
    pub run: usize,
    pub seed: u64,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: String,
    pub project: String,
    pub generated_at: DateTime<Utc>,
    pub enabled: bool,
    pub parallelism: usize,
    pub elapsed_ms: u64,
    pub total_runs: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub duration: Option<Stats>,
    pub cost: Option<Stats>,
    pub total_work: Option<Stats>,
    pub failures: Vec<RunFailure>,
}

impl BatchReport {
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn build_report(batch: &BatchResult, project: &str) -> BatchReport {
    let summaries = batch.summaries();
    let durations: Vec<f64> = summaries.iter().map(|s| f64::from(s.duration)).collect();
    let costs: Vec<f64> = summaries.iter().map(|s| s.cost).collect();
    let work: Vec<f64> = summaries.iter().map(|s| s.total_work).collect();

    let failures = batch
        .runs
        .iter()
        .filter_map(|r| match &r.outcome {
            RunOutcome::Failed { error } => Some(RunFailure {
                run: r.run,
                seed: r.seed,
                error: error.clone(),
            }),
            _ => None,
        })
        .collect();

    BatchReport {
        batch_id: batch.batch_id.clone(),
        project: project.to_string(),
        generated_at: Utc::now(),
        enabled: batch.enabled,
        parallelism: batch.parallelism,
        elapsed_ms: batch.duration_ms,
        total_runs: batch.runs.len(),
        completed: batch.completed(),
        failed: batch.failed(),
        cancelled: batch.cancelled(),
        duration: Stats::from_samples(&durations),
        cost: Stats::from_samples(&costs),
        total_work: Stats::from_samples(&work),
        failures,
    }
}

pub fn format_text(report: &BatchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Batch {} ({})", report.batch_id, report.project);
    if !report.enabled {
        out.push_str("  monte carlo disabled\n");
        return out;
    }
    let _ = writeln!(
        out,
        "  runs: {} completed, {} failed, {} cancelled ({} workers, {} ms)",
        report.completed, report.failed, report.cancelled, report.parallelism, report.elapsed_ms
    );

    for (label, stats) in [
        ("duration", &report.duration),
        ("cost", &report.cost),
        ("total work", &report.total_work),
    ] {
        match stats {
            Some(s) => {
                let _ = writeln!(
                    out,
                    "  {label:<10} mean {} sd {} min {} p50 {} p90 {} max {}",
                    fmt_num(s.mean),
                    fmt_num(s.std_dev),
                    fmt_num(s.min),
                    fmt_num(s.p50),
                    fmt_num(s.p90),
                    fmt_num(s.max)
                );
            }
            None => {
                let _ = writeln!(out, "  {label:<10} n/a");
            }
        }
    }

    for failure in &report.failures {
        let _ = writeln!(
            out,
            "  run {} (seed {}) failed: {}",
            failure.run, failure.seed, failure.error
        );
    }
    out
}

/// The per-run scalar summary of a finished batch, completed runs only.
pub fn summary_csv(batch: &BatchResult) -> String {
    let mut out = String::from(SUMMARY_HEADER);
    out.push('\n');
    for summary in batch.summaries() {
        out.push_str(&summary.to_csv_line());
        out.push('\n');
    }
    out
}
