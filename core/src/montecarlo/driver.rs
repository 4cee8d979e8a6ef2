use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::error::BatchError;
use crate::model::ProjectModel;
use crate::report::{start_line_sink, FsArtifactSink, SUMMARY_HEADER};
use crate::simulator::Simulator;

use super::progress::ProgressMonitor;
use super::scheduler::{concurrency_context, execute_runs_parallel};
use super::traits::{ArtifactSink, ConcurrencyStrategyPlugin, OutputRendererPlugin, RenderEvent};
use super::types::{BatchOpts, BatchResult, CancellationFlag, RunOutcome, RunResult};

/// Runs N independent simulations of one project in parallel.
pub struct MonteCarloDriver {
    template: Arc<ProjectModel>,
    opts: BatchOpts,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
    concurrency_strategy: Option<Arc<dyn ConcurrencyStrategyPlugin>>,
    artifact_sink: Option<Arc<dyn ArtifactSink>>,
    cancel: CancellationFlag,
}

impl MonteCarloDriver {
    pub fn new(template: ProjectModel, opts: BatchOpts) -> Self {
        let artifact_sink: Option<Arc<dyn ArtifactSink>> = match &opts.output_dir {
            Some(dir) if opts.write_artifacts => {
                Some(Arc::new(FsArtifactSink::new(dir.clone(), opts.report)))
            }
            _ => None,
        };

        Self {
            template: Arc::new(template),
            opts,
            renderer: None,
            concurrency_strategy: None,
            artifact_sink,
            cancel: CancellationFlag::new(),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn OutputRendererPlugin>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_concurrency_strategy(
        mut self,
        strategy: Arc<dyn ConcurrencyStrategyPlugin>,
    ) -> Self {
        self.concurrency_strategy = Some(strategy);
        self
    }

    pub fn with_artifact_sink(mut self, sink: Arc<dyn ArtifactSink>) -> Self {
        self.artifact_sink = Some(sink);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    fn resolve_parallelism(&self) -> usize {
        let base = self
            .opts
            .max_parallel
            .filter(|n| *n > 0)
            .unwrap_or_else(num_cpus::get)
            .max(1);

        match &self.concurrency_strategy {
            Some(strategy) => {
                let ctx = concurrency_context(base, 0);
                let n = strategy.calculate_concurrency(&ctx).max(1);
                tracing::debug!(
                    strategy = strategy.name(),
                    base,
                    cpu_usage = ctx.cpu_usage,
                    parallelism = n,
                    "worker pool sized"
                );
                n
            }
            None => base,
        }
    }

    fn emit(&self, event: RenderEvent) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&event);
        }
    }

    /// Execute the batch. `runs == 0` is a no-op returning a disabled result.
    ///
    /// A failing run (tick budget, artifact I/O) is recorded and never stops
    /// its siblings; only a broken worker pool fails the whole batch.
    #[tracing::instrument(name = "montecarlo.run", skip(self), fields(runs = self.opts.runs))]
    pub async fn run(&self) -> Result<BatchResult, BatchError> {
        let batch_id = Uuid::new_v4().to_string();
        if self.opts.runs == 0 {
            tracing::info!("monte carlo disabled (runs = 0)");
            return Ok(BatchResult::disabled(batch_id));
        }

        let started = Instant::now();
        let parallelism = self.resolve_parallelism();
        self.emit(RenderEvent::BatchStart {
            batch_id: batch_id.clone(),
            total_runs: self.opts.runs,
            parallelism,
        });

        let summary_sink = match &self.opts.output_dir {
            Some(dir) => Some(start_line_sink(&dir.join("summary.csv"), Some(SUMMARY_HEADER)).await?),
            None => None,
        };
        let summary_tx = summary_sink.as_ref().map(|s| s.sender());
        let monitor = ProgressMonitor::new(self.opts.runs, self.opts.progress_bar);

        let executor = |index: usize| {
            let template = Arc::clone(&self.template);
            let sim_opts = self.opts.simulation.with_seed(self.opts.seed_for(index));
            let cancel = self.cancel.clone();
            let renderer = self.renderer.clone();
            let artifact_sink = self.artifact_sink.clone();
            let summary_tx = summary_tx.clone();
            let batch_id = batch_id.clone();

            async move {
                let seed = sim_opts.seed;
                if cancel.is_cancelled() {
                    return Ok(RunResult {
                        run: index,
                        seed,
                        elapsed_ms: 0,
                        outcome: RunOutcome::Cancelled,
                    });
                }

                if let Some(renderer) = &renderer {
                    renderer.render(&RenderEvent::RunStart {
                        batch_id,
                        run: index,
                        seed,
                    });
                }

                let run_started = Instant::now();
                let project = (*template).clone();
                let (outcome, project) = tokio::task::spawn_blocking(move || {
                    let mut sim = Simulator::new(project, sim_opts).with_run_index(index);
                    let outcome = sim.execute();
                    (outcome, sim.into_project())
                })
                .await
                .map_err(|e| BatchError::Worker {
                    run: index,
                    message: e.to_string(),
                })?;

                let outcome = match outcome {
                    Ok(summary) => {
                        let written = match &artifact_sink {
                            Some(sink) => sink.write_run(index, &project).await,
                            None => Ok(()),
                        };
                        match written {
                            Ok(()) => {
                                if let Some(tx) = &summary_tx {
                                    tx.send_line(summary.to_csv_line()).await;
                                }
                                RunOutcome::Completed(summary)
                            }
                            Err(e) => {
                                tracing::warn!(run = index, error = %e, "artifact write failed");
                                RunOutcome::Failed {
                                    error: e.to_string(),
                                }
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(run = index, error = %e, "run failed");
                        RunOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                };

                Ok(RunResult {
                    run: index,
                    seed,
                    elapsed_ms: run_started.elapsed().as_millis() as u64,
                    outcome,
                })
            }
        };

        let results = execute_runs_parallel(self.opts.runs, parallelism, executor, |result| {
            monitor.complete_run(result.run, result.is_success());
            self.emit(RenderEvent::RunComplete {
                batch_id: batch_id.clone(),
                result: result.clone(),
            });
        })
        .await;

        drop(summary_tx);
        if let Some(sink) = summary_sink {
            sink.close().await;
        }
        let runs = results?;

        let result = BatchResult {
            batch_id: batch_id.clone(),
            enabled: true,
            parallelism,
            duration_ms: started.elapsed().as_millis() as u64,
            runs,
        };

        monitor.finish(result.completed(), result.failed());
        self.emit(RenderEvent::BatchEnd {
            batch_id,
            completed: result.completed(),
            failed: result.failed(),
            cancelled: result.cancelled(),
            duration_ms: result.duration_ms,
        });
        tracing::info!(
            completed = result.completed(),
            failed = result.failed(),
            cancelled = result.cancelled(),
            duration_ms = result.duration_ms,
            "batch complete"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DelayEntry, ModelOptions, ProjectSpec, ResourceSpec, TaskSpec, WorkAmountEntry,
        WorkflowSpec,
    };
    use crate::simulator::SimulationOpts;

    fn delayed_chain() -> ProjectModel {
        let task = |name: &str, deps: &[&str], amount: f64| TaskSpec {
            name: name.to_string(),
            node_id: None,
            predecessors: deps.iter().map(|d| d.to_string()).collect(),
            minimum_work_amount: vec![WorkAmountEntry {
                occurrence: 1,
                amount,
            }],
            rework: vec![],
            delay: vec![DelayEntry {
                occurrence: 1,
                probability: 0.5,
                extra_work: 2.0,
            }],
        };
        let spec = ProjectSpec {
            name: "delayed".to_string(),
            workflows: vec![WorkflowSpec {
                id: "wf".to_string(),
                tasks: vec![task("A", &[], 2.0), task("B", &["A"], 3.0)],
            }],
            resources: vec![ResourceSpec {
                name: "R".to_string(),
                node_id: None,
                cost_per_time: 2.0,
                work_amount_skill: [("A".to_string(), 1.0), ("B".to_string(), 1.0)]
                    .into_iter()
                    .collect(),
                quality_skill: Default::default(),
            }],
        };
        ProjectModel::from_spec(&spec, ModelOptions::default()).unwrap()
    }

    fn opts(runs: usize) -> BatchOpts {
        BatchOpts {
            runs,
            base_seed: 42,
            max_parallel: Some(2),
            ..BatchOpts::default()
        }
    }

    #[tokio::test]
    async fn test_zero_runs_is_disabled() {
        let result = MonteCarloDriver::new(delayed_chain(), opts(0))
            .run()
            .await
            .unwrap();
        assert!(!result.enabled);
        assert!(result.runs.is_empty());
    }

    #[tokio::test]
    async fn test_single_run_matches_direct_simulation() {
        let result = MonteCarloDriver::new(delayed_chain(), opts(1))
            .run()
            .await
            .unwrap();
        let batch = result.summaries()[0].clone();

        let mut sim = Simulator::new(delayed_chain(), SimulationOpts::default().with_seed(42));
        let direct = sim.execute().unwrap();

        assert_eq!(batch.duration, direct.duration);
        assert_eq!(batch.cost, direct.cost);
        assert_eq!(batch.total_work, direct.total_work);
        assert_eq!(batch.seed, 42);
    }

    #[tokio::test]
    async fn test_runs_are_sorted_and_seeded_by_index() {
        let result = MonteCarloDriver::new(delayed_chain(), opts(8))
            .run()
            .await
            .unwrap();
        assert_eq!(result.completed(), 8);
        for (i, run) in result.runs.iter().enumerate() {
            assert_eq!(run.run, i);
            assert_eq!(run.seed, 42 + i as u64);
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let driver = MonteCarloDriver::new(delayed_chain(), opts(4));
        driver.cancellation_flag().cancel();
        let result = driver.run().await.unwrap();
        assert_eq!(result.cancelled(), 4);
        assert_eq!(result.completed(), 0);
    }

    #[tokio::test]
    async fn test_failed_runs_do_not_abort_batch() {
        let mut o = opts(3);
        o.simulation.max_ticks = Some(1);
        let result = MonteCarloDriver::new(delayed_chain(), o).run().await.unwrap();
        assert_eq!(result.failed(), 3);
        assert_eq!(result.runs.len(), 3);
    }

    #[tokio::test]
    async fn test_artifacts_and_summary_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut o = opts(3);
        o.write_artifacts = true;
        o.output_dir = Some(dir.path().to_path_buf());

        let result = MonteCarloDriver::new(delayed_chain(), o).run().await.unwrap();
        assert_eq!(result.completed(), 3);

        for run in 0..3 {
            assert!(dir.path().join(format!("run-{run}.csv")).exists());
            assert!(dir.path().join(format!("run-{run}.log")).exists());
        }
        let summary = std::fs::read_to_string(dir.path().join("summary.csv")).unwrap();
        let mut lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.remove(0), crate::report::SUMMARY_HEADER);
        assert_eq!(lines.len(), 3);
    }
}
