//! Parallel multi-run driver.
//!
//! ```text
//! ProjectModel (validated template)
//!   ↓ clone per run, seed = base_seed + run
//! execute_runs_parallel()  → Semaphore-bounded spawn_blocking workers
//!   ↓
//! RunResult (completed | failed | cancelled), sorted by run index
//!   ↓
//! BatchResult → report::summary
//! ```

mod driver;
mod progress;
mod scheduler;
pub mod traits;
pub mod types;

pub use driver::MonteCarloDriver;
pub use progress::ProgressMonitor;
pub use scheduler::{concurrency_context, execute_runs_parallel};
pub use traits::{
    ArtifactSink, ConcurrencyContext, ConcurrencyStrategyPlugin, OutputRendererPlugin,
    RenderEvent,
};
pub use types::{BatchOpts, BatchResult, CancellationFlag, RunOutcome, RunResult};
