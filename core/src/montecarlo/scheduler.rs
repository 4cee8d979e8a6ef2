use std::future::Future;
use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::Semaphore;

use crate::error::BatchError;

use super::traits::ConcurrencyContext;
use super::types::RunResult;

/// Execute runs `0..total` with at most `max_concurrency` in flight
///
/// # Arguments
///
/// * `total` - Number of runs
/// * `max_concurrency` - Permits of the worker pool
/// * `executor_fn` - Produces the future of a single run; it runs once a permit is held
/// * `on_complete` - Called as each run finishes, in completion order
///
/// # Returns
///
/// All run results sorted by run index
pub async fn execute_runs_parallel<F, Fut, C>(
    total: usize,
    max_concurrency: usize,
    executor_fn: F,
    mut on_complete: C,
) -> Result<Vec<RunResult>, BatchError>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = Result<RunResult, BatchError>>,
    C: FnMut(&RunResult),
{
    let sem = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut futs: FuturesUnordered<_> = FuturesUnordered::new();

    for index in 0..total {
        let sem = sem.clone();
        let run = executor_fn(index);

        futs.push(async move {
            let _permit = sem
                .acquire_owned()
                .await
                .map_err(|_| BatchError::PoolClosed)?;

            run.await
        });
    }

    let mut results: Vec<RunResult> = Vec::with_capacity(total);

    while let Some(res) = futs.next().await {
        let run_result = res?;
        on_complete(&run_result);
        results.push(run_result);
    }

    results.sort_by_key(|r| r.run);
    Ok(results)
}

/// Snapshot of CPU and memory load used to size the worker pool.
pub fn concurrency_context(base_concurrency: usize, active_runs: usize) -> ConcurrencyContext {
    let mut sys = sysinfo::System::new();
    sys.refresh_cpu();
    sys.refresh_memory();
    let cpu_count = sys.cpus().len().max(1);
    let cpu_usage = sys.cpus().iter().map(|c| c.cpu_usage()).sum::<f32>() / cpu_count as f32;
    let total_memory = sys.total_memory().max(1);
    let memory_usage = (sys.used_memory() as f32 / total_memory as f32) * 100.0;

    ConcurrencyContext {
        cpu_usage,
        available_cpus: num_cpus::get().max(1),
        memory_usage,
        active_runs,
        base_concurrency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::montecarlo::types::RunOutcome;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_results_sorted_and_concurrency_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut seen = Vec::new();

        let results = execute_runs_parallel(
            6,
            2,
            |index| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(std::time::Duration::from_millis(
                        (6 - index as u64) * 2,
                    ))
                    .await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(RunResult {
                        run: index,
                        seed: index as u64,
                        elapsed_ms: 0,
                        outcome: RunOutcome::Cancelled,
                    })
                }
            },
            |r| seen.push(r.run),
        )
        .await
        .unwrap();

        let order: Vec<usize> = results.iter().map(|r| r.run).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(seen.len(), 6);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_concurrency_context_reports_cpus() {
        let ctx = concurrency_context(4, 0);
        assert!(ctx.available_cpus >= 1);
        assert_eq!(ctx.base_concurrency, 4);
    }
}
