use async_trait::async_trait;

use crate::error::ReportError;
use crate::model::ProjectModel;

use super::types::RunResult;

/// Worker pool sizing strategy
pub trait ConcurrencyStrategyPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn calculate_concurrency(&self, context: &ConcurrencyContext) -> usize;
}

#[derive(Debug, Clone)]
pub struct ConcurrencyContext {
    pub cpu_usage: f32,
    pub available_cpus: usize,
    pub memory_usage: f32,
    pub active_runs: usize,
    pub base_concurrency: usize,
}

/// Batch progress renderer (controls output format)
pub trait OutputRendererPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn supports_streaming(&self) -> bool {
        false
    }
    fn render(&self, event: &RenderEvent);
}

#[derive(Debug, Clone)]
pub enum RenderEvent {
    BatchStart {
        batch_id: String,
        total_runs: usize,
        parallelism: usize,
    },
    RunStart {
        batch_id: String,
        run: usize,
        seed: u64,
    },
    RunComplete {
        batch_id: String,
        result: RunResult,
    },
    BatchEnd {
        batch_id: String,
        completed: usize,
        failed: usize,
        cancelled: usize,
        duration_ms: u64,
    },
}

/// Destination of the per-run timeline artifacts.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    fn name(&self) -> &str;
    async fn write_run(&self, run: usize, project: &ProjectModel) -> Result<(), ReportError>;
}
