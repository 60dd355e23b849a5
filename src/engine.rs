//! Page engine: the cache-fronted entry point used by renderers.
//!
//! A request for a feed is answered from [`PageCache`] when possible.
//! On a miss the engine fetches the feed's identifier list, runs the
//! bounded aggregator over it and stores the resulting page.
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::feed::{
    aggregate, AggregateOptions, EligibilityFilter, FeedKind, FeedSource, FetchError, HnClient,
    Story,
};
use crate::storage::{spawn_sweeper, PageCache};

#[derive(Debug, Error)]
pub enum EngineError {
    /// The identifier list for a feed could not be fetched or decoded.
    /// Nothing is cached when this happens.
    #[error("could not get {feed} stories list: {source}")]
    UpstreamUnavailable {
        feed: FeedKind,
        #[source]
        source: FetchError,
    },

    /// The HTTP client could not be constructed.
    #[error("could not build HTTP client: {0}")]
    Client(#[source] FetchError),
}

/// One per process; share it behind an `Arc` between request handlers.
pub struct Engine<S: FeedSource = HnClient> {
    source: Arc<S>,
    filter: Arc<EligibilityFilter>,
    cache: Arc<PageCache>,
    options: AggregateOptions,
    sweep_interval: Duration,
    // Per-feed build locks so concurrent misses share one upstream run
    builds: Mutex<HashMap<FeedKind, Arc<tokio::sync::Mutex<()>>>>,
}

impl Engine<HnClient> {
    /// Build an engine talking to the API at `config.base_url`.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let client = HnClient::new(&config.base_url, config.request_timeout(), config.concurrency)
            .map_err(EngineError::Client)?;
        Ok(Self::with_source(client, config))
    }
}

impl<S: FeedSource> Engine<S> {
    pub fn with_source(source: S, config: &Config) -> Self {
        Self {
            source: Arc::new(source),
            filter: Arc::new(EligibilityFilter::new(config.allowed_hosts.iter().cloned())),
            cache: Arc::new(PageCache::new(config.cache_ttl())),
            options: config.aggregate_options(),
            sweep_interval: config.sweep_interval(),
            builds: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// Spawn the background sweep of expired pages on the current runtime.
    pub fn start_sweeper(&self) -> JoinHandle<()> {
        tracing::info!(
            ttl_secs = self.cache.ttl().as_secs(),
            sweep_secs = self.sweep_interval.as_secs(),
            "Started page sweeper"
        );
        spawn_sweeper(&self.cache, self.sweep_interval)
    }

    /// Return the page for a feed tag.
    ///
    /// Unknown tags resolve to the top feed. Hits and misses look the same to
    /// the caller apart from latency. Concurrent misses for one feed wait on
    /// a single build instead of each hitting the upstream API.
    ///
    /// # Errors
    ///
    /// [`EngineError::UpstreamUnavailable`] when the identifier list fetch
    /// fails. Individual item failures never surface here; they only make
    /// the page shorter.
    pub async fn get_page(&self, tag: &str) -> Result<Arc<[Story]>, EngineError> {
        let kind = FeedKind::resolve(tag);

        if let Some(page) = self.cache.get(kind) {
            tracing::debug!(feed = %kind, stories = page.len(), "Page cache hit");
            return Ok(page);
        }

        let build_lock = self.build_lock(kind);
        let _build = build_lock.lock().await;

        // Another request may have built the page while we waited
        if let Some(page) = self.cache.get(kind) {
            tracing::debug!(feed = %kind, "Page built by concurrent request");
            return Ok(page);
        }

        tracing::debug!(feed = %kind, "Page cache miss");
        self.build_page(kind).await
    }

    async fn build_page(&self, kind: FeedKind) -> Result<Arc<[Story]>, EngineError> {
        let started = Instant::now();

        let ids = self.source.fetch_ids(kind).await.map_err(|e| {
            tracing::warn!(feed = %kind, error = %e, "Failed to fetch story list");
            EngineError::UpstreamUnavailable {
                feed: kind,
                source: e,
            }
        })?;

        let page: Arc<[Story]> = aggregate(
            Arc::clone(&self.source),
            Arc::clone(&self.filter),
            &ids,
            &self.options,
        )
        .await
        .into();

        self.cache.set(kind, Arc::clone(&page));

        tracing::info!(
            feed = %kind,
            candidates = ids.len(),
            stories = page.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Built page"
        );
        Ok(page)
    }

    fn build_lock(&self, kind: FeedKind) -> Arc<tokio::sync::Mutex<()>> {
        let mut builds = self.builds.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(builds.entry(kind).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{Item, ItemKind};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Every item links to GitHub; the list fetch can be switched to fail.
    struct ListStub {
        ids: Vec<u64>,
        list_calls: AtomicUsize,
        item_calls: AtomicUsize,
        fail_list: AtomicBool,
    }

    impl ListStub {
        fn new(ids: Vec<u64>) -> Self {
            Self {
                ids,
                list_calls: AtomicUsize::new(0),
                item_calls: AtomicUsize::new(0),
                fail_list: AtomicBool::new(false),
            }
        }
    }

    impl FeedSource for Arc<ListStub> {
        async fn fetch_ids(&self, _kind: FeedKind) -> Result<Vec<u64>, FetchError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(FetchError::HttpStatus(502));
            }
            Ok(self.ids.clone())
        }

        async fn fetch_item(&self, id: u64) -> Result<Item, FetchError> {
            self.item_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(Item {
                id,
                by: "carol".into(),
                score: 7,
                time: 1_700_000_000,
                title: format!("Repo {id}"),
                kind: ItemKind::Story,
                url: format!("https://github.com/carol/{id}"),
                kids: vec![],
                descendants: 2,
            })
        }
    }

    fn engine(stub: &Arc<ListStub>) -> Engine<Arc<ListStub>> {
        Engine::with_source(Arc::clone(stub), &Config::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_request_served_from_cache() {
        let stub = Arc::new(ListStub::new((1..=5).collect()));
        let engine = engine(&stub);

        let first = engine.get_page("new").await.unwrap();
        let second = engine.get_page("new").await.unwrap();

        assert_eq!(first.len(), 5);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(stub.list_calls.load(Ordering::SeqCst), 1);
        assert_eq!(stub.item_calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_page_is_rebuilt() {
        let stub = Arc::new(ListStub::new(vec![1, 2]));
        let engine = engine(&stub);

        engine.get_page("top").await.unwrap();
        tokio::time::advance(Duration::from_secs(30 * 60)).await;
        engine.get_page("top").await.unwrap();

        assert_eq!(stub.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_tag_shares_top_page() {
        let stub = Arc::new(ListStub::new(vec![1]));
        let engine = engine(&stub);

        engine.get_page("top").await.unwrap();
        engine.get_page("no-such-feed").await.unwrap();

        assert_eq!(stub.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_share_one_build() {
        let stub = Arc::new(ListStub::new((1..=10).collect()));
        let engine = Arc::new(engine(&stub));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move { engine.get_page("show").await.unwrap() })
            })
            .collect();

        let mut pages = Vec::new();
        for handle in handles {
            pages.push(handle.await.unwrap());
        }

        assert_eq!(stub.list_calls.load(Ordering::SeqCst), 1);
        assert!(pages.iter().all(|p| Arc::ptr_eq(p, &pages[0])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_failure_is_surfaced_and_not_cached() {
        let stub = Arc::new(ListStub::new(vec![1, 2, 3]));
        stub.fail_list.store(true, Ordering::SeqCst);
        let engine = engine(&stub);

        let err = engine.get_page("best").await.unwrap_err();
        match err {
            EngineError::UpstreamUnavailable {
                feed: FeedKind::Best,
                source: FetchError::HttpStatus(502),
            } => {}
            e => panic!("Expected UpstreamUnavailable, got {:?}", e),
        }
        assert!(engine.cache().get(FeedKind::Best).is_none());
        assert!(engine.cache().is_empty());
        assert_eq!(stub.item_calls.load(Ordering::SeqCst), 0);

        // Recovers on the next request once upstream is back
        stub.fail_list.store(false, Ordering::SeqCst);
        assert_eq!(engine.get_page("best").await.unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_with_configured_interval() {
        let stub = Arc::new(ListStub::new(vec![1]));
        let engine = engine(&stub);
        let sweeper = engine.start_sweeper();
        assert_eq!(engine.cache().ttl(), Duration::from_secs(30 * 60));

        engine.get_page("top").await.unwrap();
        assert_eq!(engine.cache().len(), 1);

        // TTL 30 min, sweep every 10 min: gone by the 40 minute sweep
        tokio::time::sleep(Duration::from_secs(40 * 60 + 1)).await;
        assert!(engine.cache().is_empty());

        sweeper.abort();
    }
}
