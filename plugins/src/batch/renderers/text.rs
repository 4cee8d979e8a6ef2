use pdes_core::montecarlo::{OutputRendererPlugin, RenderEvent, RunOutcome};

pub struct TextRendererPlugin {
    ascii_only: bool,
}

impl TextRendererPlugin {
    pub fn new(ascii_only: bool) -> Self {
        Self { ascii_only }
    }

    fn format_event(&self, event: &RenderEvent) -> String {
        match event {
            RenderEvent::BatchStart {
                batch_id,
                total_runs,
                parallelism,
            } => format!(
                "BATCH START {} (runs: {}, workers: {})",
                batch_id, total_runs, parallelism
            ),
            RenderEvent::RunStart {
                batch_id,
                run,
                seed,
            } => format!("RUN START {} (run {}, seed {})", batch_id, run, seed),
            RenderEvent::RunComplete { batch_id, result } => match &result.outcome {
                RunOutcome::Completed(summary) => format!(
                    "RUN END {} (run {}, status {}, duration {}, cost {:.2}, work {:.2}, {}ms)",
                    batch_id,
                    result.run,
                    if self.ascii_only { "OK" } else { "SUCCESS" },
                    summary.duration,
                    summary.cost,
                    summary.total_work,
                    result.elapsed_ms
                ),
                RunOutcome::Failed { error } => format!(
                    "RUN END {} (run {}, status {}): {}",
                    batch_id,
                    result.run,
                    if self.ascii_only { "FAIL" } else { "FAILED" },
                    error
                ),
                RunOutcome::Cancelled => format!(
                    "RUN END {} (run {}, status CANCELLED)",
                    batch_id, result.run
                ),
            },
            RenderEvent::BatchEnd {
                batch_id,
                completed,
                failed,
                cancelled,
                duration_ms,
            } => format!(
                "BATCH END {} (completed {}, failed {}, cancelled {}, duration {}ms)",
                batch_id, completed, failed, cancelled, duration_ms
            ),
        }
    }
}

impl OutputRendererPlugin for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &RenderEvent) {
        println!("{}", self.format_event(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdes_core::montecarlo::RunResult;
    use pdes_core::simulator::RunSummary;

    #[test]
    fn test_text_renderer_run_complete() {
        let renderer = TextRendererPlugin::new(true);
        let event = RenderEvent::RunComplete {
            batch_id: "b".to_string(),
            result: RunResult {
                run: 3,
                seed: 45,
                elapsed_ms: 2,
                outcome: RunOutcome::Completed(RunSummary {
                    run: 3,
                    seed: 45,
                    duration: 12,
                    cost: 30.0,
                    total_work: 11.5,
                    ticks: 12,
                }),
            },
        };

        let line = renderer.format_event(&event);
        assert_eq!(
            line,
            "RUN END b (run 3, status OK, duration 12, cost 30.00, work 11.50, 2ms)"
        );
    }

    #[test]
    fn test_text_renderer_failed_run() {
        let renderer = TextRendererPlugin::new(false);
        let event = RenderEvent::RunComplete {
            batch_id: "b".to_string(),
            result: RunResult {
                run: 1,
                seed: 1,
                elapsed_ms: 0,
                outcome: RunOutcome::Failed {
                    error: "tick budget".to_string(),
                },
            },
        };
        let line = renderer.format_event(&event);
        assert!(line.contains("status FAILED"));
        assert!(line.ends_with("tick budget"));
    }
}
