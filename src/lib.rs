//! Hacker News, filtered down to stories that link to GitHub or GitLab.
//!
//! The [`engine::Engine`] is the entry point: it resolves a feed tag,
//! serves pages from an in-memory TTL cache and rebuilds them on a miss
//! with a bounded-concurrency fetch of the upstream items.

pub mod config;
pub mod engine;
pub mod feed;
pub mod storage;
pub mod util;

pub use config::{Config, ConfigError};
pub use engine::{Engine, EngineError};
