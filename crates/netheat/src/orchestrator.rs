//! Bounded fan-out of independent units of work.
//!
//! All items are dispatched up front and gated through a semaphore, then
//! joined to completion. A failed unit is counted, never escalated — the
//! run always proceeds to the end, and there is no fail-fast mode.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

/// Aggregated outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Run `worker` over every item with at most `concurrency` in flight.
///
/// `concurrency == 0` means one worker per item: the whole batch hits the
/// control plane at once. That full fan-out is the default policy, chosen
/// for latency over politeness — size `concurrency` to what the control
/// plane can absorb.
pub async fn run_concurrently<T, F, Fut>(items: Vec<T>, concurrency: usize, worker: F) -> RunSummary
where
    T: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = bool> + Send + 'static,
{
    let total = items.len();
    if total == 0 {
        return RunSummary::default();
    }
    let permits = if concurrency > 0 { concurrency } else { total };
    let semaphore = Arc::new(Semaphore::new(permits));

    let mut tasks = JoinSet::new();
    for item in items {
        let semaphore = semaphore.clone();
        // Futures are lazy: the unit does no work until its task holds a
        // permit.
        let unit = worker(item);
        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("semaphore is never closed");
            unit.await
        });
    }

    let mut summary = RunSummary {
        total,
        ..Default::default()
    };
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(true) => summary.succeeded += 1,
            Ok(false) => summary.failed += 1,
            Err(e) => {
                warn!(error = %e, "worker task panicked");
                summary.failed += 1;
            }
        }
    }
    summary
}
