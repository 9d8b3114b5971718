use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::collector::SampleCollector;
use crate::report::PercentileReport;

#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Logical calls to dispatch.
    pub call_count: usize,
    /// Worker pool size; at most this many calls are in flight at once.
    pub concurrency: usize,
    /// Deadline applied to each call individually.
    pub call_deadline: Duration,
    /// Bound on the join phase once every call has been dispatched.
    pub batch_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum DriverError {
    /// The worker pool stopped accepting submissions. Fatal: the run
    /// produces no report.
    #[error("Worker pool exhausted: {0}")]
    PoolExhausted(String),
}

/// Dispatch `opts.call_count` calls across a pool of `opts.concurrency`
/// workers, measure each call's wall-clock latency, and summarize the
/// percentiles once everything has completed.
///
/// A failed or timed-out call becomes a failed observation and never aborts
/// the run. The join phase is bounded by `opts.batch_timeout`; calls still
/// in flight when it fires are aborted and accounted as deadline failures,
/// so every dispatched call yields exactly one observation either way.
pub async fn run<F, Fut, E>(opts: DriverOptions, call: F) -> Result<PercentileReport, DriverError>
where
    F: Fn(usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<(), E>> + Send + 'static,
    E: Send + 'static,
{
    let collector = Arc::new(SampleCollector::new());
    let pool = Arc::new(Semaphore::new(opts.concurrency.max(1)));
    let call = Arc::new(call);
    let mut tasks: JoinSet<()> = JoinSet::new();

    // Dispatch: one task per logical call; the semaphore caps concurrency.
    // Per-call deadlines bound how long this loop can wait for a permit.
    for index in 0..opts.call_count {
        let permit = pool
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| DriverError::PoolExhausted(e.to_string()))?;
        let collector = Arc::clone(&collector);
        let call = Arc::clone(&call);
        let deadline = opts.call_deadline;
        tasks.spawn(async move {
            let _permit = permit;
            let start = Instant::now();
            let outcome = tokio::time::timeout(deadline, call(index)).await;
            let succeeded = matches!(outcome, Ok(Ok(())));
            collector.record(start.elapsed(), succeeded);
        });
    }

    // Await: block until every task completes or the batch timeout fires.
    let batch_deadline = tokio::time::Instant::now() + opts.batch_timeout;
    loop {
        match tokio::time::timeout_at(batch_deadline, tasks.join_next()).await {
            // Panicked tasks are picked up by the top-up below.
            Ok(Some(_joined)) => {}
            Ok(None) => break,
            Err(_) => {
                tasks.abort_all();
                while tasks.join_next().await.is_some() {}
                break;
            }
        }
    }

    // Report: tasks aborted (or panicked) before recording are accounted as
    // deadline failures so the observation count matches the dispatch count.
    let missing = opts.call_count.saturating_sub(collector.recorded_count());
    for _ in 0..missing {
        collector.record(opts.call_deadline, false);
    }

    let samples = collector.drain();
    Ok(PercentileReport::compute(&samples))
}
