//! Report writers: Gantt CSV, event log, and batch statistics.
//!
//! Everything here renders to `String` first; the `write_*` helpers only move
//! rendered text to disk so the formats stay testable without a filesystem.

mod artifacts;
mod event_log;
mod gantt;
mod sink;
mod summary;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::model::ProjectModel;

pub use artifacts::FsArtifactSink;
pub use event_log::{render_event_log, write_event_log};
pub use gantt::{render_gantt_csv, write_gantt_csv};
pub use sink::{start_line_sink, LineSink, LineSinkTx};
pub use summary::{
    build_report, format_text, summary_csv, BatchReport, RunFailure, Stats, SUMMARY_HEADER,
};

const UTF8_BOM: &str = "\u{feff}";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// Ticks per reported time unit.
    pub time_scale: f64,
    pub utf8_bom: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            utf8_bom: true,
        }
    }
}

impl ReportOptions {
    pub fn from_config(cfg: &ReportConfig) -> Self {
        Self {
            time_scale: cfg.time_scale,
            utf8_bom: cfg.utf8_bom,
        }
    }

    /// Report time of a tick: 1-based, divided by the scale.
    pub fn time(&self, tick: u32) -> f64 {
        let scale = if self.time_scale.is_finite() && self.time_scale > 0.0 {
            self.time_scale
        } else {
            1.0
        };
        f64::from(tick + 1) / scale
    }
}

pub fn gantt_path(dir: &Path, run: usize) -> PathBuf {
    dir.join(format!("run-{run}.csv"))
}

pub fn event_log_path(dir: &Path, run: usize) -> PathBuf {
    dir.join(format!("run-{run}.log"))
}

/// Write `run-<n>.csv` and `run-<n>.log` for one finished run.
pub async fn write_run_artifacts(
    project: &ProjectModel,
    dir: &Path,
    run: usize,
    opts: &ReportOptions,
) -> Result<(), ReportError> {
    ensure_dir(dir).await?;
    write_gantt_csv(project, &gantt_path(dir, run), opts).await?;
    write_event_log(project, run, &event_log_path(dir, run), opts).await?;
    tracing::debug!(run, dir = %dir.display(), "run artifacts written");
    Ok(())
}

pub(crate) async fn ensure_dir(dir: &Path) -> Result<(), ReportError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| ReportError::CreateDir {
            path: dir.display().to_string(),
            source,
        })
}

pub(crate) async fn write_text(path: &Path, text: &str) -> Result<(), ReportError> {
    tokio::fs::write(path, text)
        .await
        .map_err(|source| ReportError::Write {
            path: path.display().to_string(),
            source,
        })
}

/// Format a report number without trailing zeros ("3" rather than "3.000000").
pub(crate) fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let s = format!("{value:.6}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Quote a CSV field when it carries a separator, quote or newline.
pub(crate) fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_time_is_one_based_and_scaled() {
        let opts = ReportOptions::default();
        assert_eq!(opts.time(0), 1.0);
        assert_eq!(opts.time(4), 5.0);

        let scaled = ReportOptions {
            time_scale: 2.0,
            utf8_bom: false,
        };
        assert_eq!(scaled.time(3), 2.0);
    }

    #[test]
    fn test_invalid_scale_falls_back_to_one() {
        let opts = ReportOptions {
            time_scale: 0.0,
            utf8_bom: false,
        };
        assert_eq!(opts.time(1), 2.0);
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(3.0), "3");
        assert_eq!(fmt_num(2.5), "2.5");
        assert_eq!(fmt_num(1.0 / 3.0), "0.333333");
    }

    #[test]
    fn test_csv_field_quotes_separators() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
