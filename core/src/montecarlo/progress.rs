use indicatif::{ProgressBar, ProgressStyle};

/// Visual progress of a Monte Carlo batch
pub struct ProgressMonitor {
    overall: ProgressBar,
    enabled: bool,
}

impl ProgressMonitor {
    /// Create a new progress monitor
    ///
    /// # Arguments
    ///
    /// * `total_runs` - Number of runs in the batch
    /// * `enabled` - Whether to draw the bar (disabled for jsonl output)
    pub fn new(total_runs: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                overall: ProgressBar::hidden(),
                enabled: false,
            };
        }

        let overall = ProgressBar::new(total_runs as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} runs ({percent}%) {msg}")
        {
            overall.set_style(style.progress_chars("█▓▒░  "));
        }
        overall.set_message("Starting...");

        Self {
            overall,
            enabled: true,
        }
    }

    /// Mark a run as completed
    pub fn complete_run(&self, run: usize, success: bool) {
        if !self.enabled {
            return;
        }
        if !success {
            self.overall.set_message(format!("run {} failed", run));
        }
        self.overall.inc(1);
    }

    pub fn set_message(&self, msg: &str) {
        if self.enabled {
            self.overall.set_message(msg.to_string());
        }
    }

    pub fn finish(&self, completed: usize, failed: usize) {
        if !self.enabled {
            return;
        }

        let msg = if failed == 0 {
            format!("✅ {} runs completed", completed)
        } else {
            format!("❌ {} completed, {} failed", completed, failed)
        };

        self.overall.finish_with_message(msg);
    }
}
