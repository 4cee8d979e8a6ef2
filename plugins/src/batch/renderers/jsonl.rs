use chrono::Local;
use pdes_core::montecarlo::{OutputRendererPlugin, RenderEvent, RunOutcome};
use serde_json::{json, Value};

pub struct JsonlRendererPlugin {
    pretty_print: bool,
}

impl JsonlRendererPlugin {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_to_json(&self, event: &RenderEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        match event {
            RenderEvent::BatchStart {
                batch_id,
                total_runs,
                parallelism,
            } => json!({
                "v": 1,
                "event_type": "batch.start",
                "ts": ts,
                "batch_id": batch_id,
                "metadata": {
                    "total_runs": total_runs,
                    "parallelism": parallelism,
                }
            }),
            RenderEvent::RunStart {
                batch_id,
                run,
                seed,
            } => json!({
                "v": 1,
                "event_type": "run.start",
                "ts": ts,
                "batch_id": batch_id,
                "run": run,
                "metadata": {
                    "seed": seed,
                }
            }),
            RenderEvent::RunComplete { batch_id, result } => {
                let status = match &result.outcome {
                    RunOutcome::Completed(_) => "completed",
                    RunOutcome::Failed { .. } => "failed",
                    RunOutcome::Cancelled => "cancelled",
                };
                let mut metadata = json!({
                    "seed": result.seed,
                    "elapsed_ms": result.elapsed_ms,
                    "success": result.is_success(),
                });
                match &result.outcome {
                    RunOutcome::Completed(summary) => {
                        metadata["duration"] = json!(summary.duration);
                        metadata["cost"] = json!(summary.cost);
                        metadata["total_work"] = json!(summary.total_work);
                    }
                    RunOutcome::Failed { error } => {
                        metadata["error"] = json!(error);
                    }
                    RunOutcome::Cancelled => {}
                }
                json!({
                    "v": 1,
                    "event_type": "run.end",
                    "ts": ts,
                    "batch_id": batch_id,
                    "run": result.run,
                    "status": status,
                    "metadata": metadata,
                })
            }
            RenderEvent::BatchEnd {
                batch_id,
                completed,
                failed,
                cancelled,
                duration_ms,
            } => json!({
                "v": 1,
                "event_type": "batch.end",
                "ts": ts,
                "batch_id": batch_id,
                "metadata": {
                    "completed": completed,
                    "failed": failed,
                    "cancelled": cancelled,
                    "duration_ms": duration_ms,
                }
            }),
        }
    }
}

impl OutputRendererPlugin for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    fn render(&self, event: &RenderEvent) {
        let value = self.event_to_json(event);
        if self.pretty_print {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".into()));
        } else {
            println!("{}", serde_json::to_string(&value).unwrap_or_else(|_| "{}".into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdes_core::montecarlo::RunResult;
    use pdes_core::simulator::RunSummary;

    #[test]
    fn test_jsonl_renderer_event_type() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::BatchStart {
            batch_id: "b".to_string(),
            total_runs: 10,
            parallelism: 4,
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "batch.start");
        assert_eq!(value["metadata"]["total_runs"], 10);
    }

    #[test]
    fn test_jsonl_renderer_run_complete() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::RunComplete {
            batch_id: "b".to_string(),
            result: RunResult {
                run: 2,
                seed: 44,
                elapsed_ms: 1,
                outcome: RunOutcome::Completed(RunSummary {
                    run: 2,
                    seed: 44,
                    duration: 8,
                    cost: 16.0,
                    total_work: 11.0,
                    ticks: 8,
                }),
            },
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "run.end");
        assert_eq!(value["status"], "completed");
        assert_eq!(value["metadata"]["duration"], 8);
        assert_eq!(value["metadata"]["success"], true);
    }

    #[test]
    fn test_jsonl_renderer_cancelled_run() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::RunComplete {
            batch_id: "b".to_string(),
            result: RunResult {
                run: 5,
                seed: 5,
                elapsed_ms: 0,
                outcome: RunOutcome::Cancelled,
            },
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["status"], "cancelled");
        assert_eq!(value["metadata"]["success"], false);
    }
}
