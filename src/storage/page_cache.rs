use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::feed::{FeedKind, Story};

/// Default lifetime of a computed page (30 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Default period of the background sweep (10 minutes)
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Longest sweep period `spawn_sweeper` will schedule (one week)
pub const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

struct CacheEntry {
    stories: Arc<[Story]>,
    created_at: Instant,
}

/// In-memory pages keyed by feed, each living for a fixed TTL from `set`.
///
/// Expiry is checked on every `get`, so a caller never sees a page older
/// than the TTL even if the sweeper has not run yet. The sweeper only
/// reclaims memory.
pub struct PageCache {
    entries: RwLock<HashMap<FeedKind, CacheEntry>>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the live page for `kind`, or `None` if absent or expired.
    pub fn get(&self, kind: FeedKind) -> Option<Arc<[Story]>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&kind)
            .filter(|entry| entry.created_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.stories))
    }

    /// Store `stories` for `kind`, replacing any previous page wholesale.
    pub fn set(&self, kind: FeedKind, stories: Arc<[Story]>) {
        let entry = CacheEntry {
            stories,
            created_at: Instant::now(),
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, entry);
    }

    /// Delete every expired page.
    ///
    /// Returns the number of pages evicted.
    pub fn sweep(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.created_at.elapsed() < self.ttl);
        before - entries.len()
    }

    /// Number of stored pages, expired ones included until the next sweep.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run [`PageCache::sweep`] every `interval` on the current tokio runtime.
///
/// The task holds only a weak reference and exits after the cache is dropped.
/// `interval` is clamped to `1ms..=MAX_SWEEP_INTERVAL`.
pub fn spawn_sweeper(cache: &Arc<PageCache>, interval: Duration) -> JoinHandle<()> {
    let cache: Weak<PageCache> = Arc::downgrade(cache);
    let interval = interval.clamp(Duration::from_millis(1), MAX_SWEEP_INTERVAL);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let Some(cache) = cache.upgrade() else {
                tracing::debug!("Page cache dropped, stopping sweeper");
                break;
            };
            let evicted = cache.sweep();
            if evicted > 0 {
                tracing::debug!(evicted = evicted, remaining = cache.len(), "Swept expired pages");
            }
        }
    })
}
