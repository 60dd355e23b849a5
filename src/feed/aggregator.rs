use crate::feed::client::FeedSource;
use crate::feed::filter::EligibilityFilter;
use crate::feed::item::Story;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// Tuning for one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Maximum number of eligible stories on a page
    pub target_count: usize,
    /// Maximum item fetches in flight at once
    pub concurrency: usize,
    /// Pause between admitting two fetches, to stay under the API rate limit
    pub admission_delay: Duration,
    /// Sort the page by upstream rank instead of completion order
    pub rank_order: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            target_count: 30,
            concurrency: 10,
            admission_delay: Duration::from_millis(10),
            rank_order: true,
        }
    }
}

/// Fetch items for `ids` concurrently and keep the eligible ones.
///
/// Walks `ids` in order. Before each fetch the orchestrator waits out the
/// admission delay and takes a permit from a semaphore of `concurrency`
/// slots; the permit moves into the spawned task and is released when the
/// task ends, whatever the outcome.
///
/// An eligible story only enters the page after claiming a slot through an
/// atomic counter capped at `target_count`. Stories that lose the claim
/// are discarded, so the page never exceeds the target. Admission stops as
/// soon as the counter reaches the target, which means the page only comes
/// up short when `ids` runs out.
///
/// Tasks report stories over a channel; the caller drains it once every
/// admitted task has been joined. Failed item fetches are logged at debug
/// level and skipped.
pub async fn aggregate<S: FeedSource>(
    source: Arc<S>,
    filter: Arc<EligibilityFilter>,
    ids: &[u64],
    options: &AggregateOptions,
) -> Vec<Story> {
    let target = options.target_count;
    if target == 0 || ids.is_empty() {
        return Vec::new();
    }

    let gate = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let claimed = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let (story_tx, mut story_rx) = mpsc::unbounded_channel::<(usize, Story)>();
    let mut tasks = JoinSet::new();
    let mut admitted = 0usize;

    for (rank, &id) in ids.iter().enumerate() {
        if claimed.load(Ordering::Acquire) >= target {
            break;
        }

        if rank > 0 && !options.admission_delay.is_zero() {
            tokio::time::sleep(options.admission_delay).await;
        }

        let Ok(permit) = Arc::clone(&gate).acquire_owned().await else {
            // Only reachable if the gate is closed, which this function never does
            break;
        };

        // In-flight tasks may have filled the page while we waited for a slot
        if claimed.load(Ordering::Acquire) >= target {
            break;
        }

        let source = Arc::clone(&source);
        let filter = Arc::clone(&filter);
        let claimed = Arc::clone(&claimed);
        let failed = Arc::clone(&failed);
        let story_tx = story_tx.clone();

        tasks.spawn(async move {
            let _permit = permit;

            let item = match source.fetch_item(id).await {
                Ok(item) => item,
                Err(e) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(id = id, error = %e, "Dropping item that failed to fetch");
                    return;
                }
            };

            let Some(story) = filter.evaluate(item, Utc::now()) else {
                return;
            };

            let won_slot = claimed
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                    (n < target).then_some(n + 1)
                })
                .is_ok();

            if won_slot {
                // Receiver outlives every task; it is only drained after the join
                let _ = story_tx.send((rank, story));
            } else {
                tracing::trace!(id = id, "Page already full, discarding eligible story");
            }
        });
        admitted += 1;
    }

    // The collector sees end-of-stream once the last task's sender is gone
    drop(story_tx);

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::warn!(error = %e, "Item task did not complete");
        }
    }

    let mut collected = Vec::with_capacity(target.min(admitted));
    while let Some(entry) = story_rx.recv().await {
        collected.push(entry);
    }

    if options.rank_order {
        collected.sort_by_key(|(rank, _)| *rank);
    }

    tracing::debug!(
        candidates = ids.len(),
        admitted = admitted,
        failed = failed.load(Ordering::Relaxed),
        eligible = collected.len(),
        "Aggregation finished"
    );

    collected.into_iter().map(|(_, story)| story).collect()
}
