//! Bounded concurrent fetch pool.
//!
//! Runs one async job per item with at most `limit` jobs in flight. A
//! semaphore admits jobs in item order; a `JoinSet` drained to exhaustion
//! is the completion barrier. Jobs that yield `None` (failures) are dropped
//! from the aggregate and never retried.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::api::{types::total_seconds, Gateway};

/// Run `work` over every item with bounded concurrency and collect the successes.
///
/// Completion order is unspecified. A `limit` of zero is treated as one.
pub async fn run_bounded<T, R, F, Fut>(items: Vec<T>, limit: usize, work: F) -> Vec<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Option<R>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut workers = JoinSet::new();

    for item in items {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };
        let job = work(item);
        workers.spawn(async move {
            let result = job.await;
            drop(permit);
            result
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(Some(result)) => results.push(result),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Pool worker did not complete"),
        }
    }
    results
}

/// Sum Tempo work-logs for each issue id, `limit` fetches at a time.
///
/// Ids whose fetch fails are absent from the returned map.
pub async fn fetch_worklog_totals(
    gateway: Arc<dyn Gateway>,
    issue_ids: Vec<String>,
    limit: usize,
) -> HashMap<String, u64> {
    let requested = issue_ids.len();
    let totals: HashMap<String, u64> = run_bounded(issue_ids, limit, move |issue_id| {
        let gateway = gateway.clone();
        async move {
            match gateway.worklogs(&issue_id).await {
                Ok(worklogs) => Some((issue_id, total_seconds(&worklogs))),
                Err(e) => {
                    debug!(issue_id = %issue_id, error = %e, "Work-log fetch failed, omitting");
                    None
                }
            }
        }
    })
    .await
    .into_iter()
    .collect();

    debug!(requested, succeeded = totals.len(), "Work-log totals fetched");
    totals
}
