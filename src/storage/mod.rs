mod page_cache;

pub use page_cache::{spawn_sweeper, PageCache, DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL, MAX_SWEEP_INTERVAL};
