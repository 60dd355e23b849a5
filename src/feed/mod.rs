//! Story retrieval from the Hacker News API.
//!
//! This module covers everything between an upstream feed and a page of
//! code-hosting stories:
//!
//! - **Resolving**: Map a page tag ("top", "new", ...) to its list endpoint
//! - **Fetching**: Identifier lists and item records over HTTP
//! - **Filtering**: Keep items linking to GitHub or GitLab and derive display fields
//! - **Aggregating**: Bounded-concurrency item fetches that stop at the target count
//!
//! # Architecture
//!
//! - [`kind`] - Feed tags and their endpoints
//! - [`item`] - Item records and enriched stories
//! - [`client`] - HTTP client and the [`FeedSource`] seam
//! - [`filter`] - Allow-list eligibility
//! - [`aggregator`] - The concurrent page builder
//!
//! # Example
//!
//! ```ignore
//! use codehn::feed::{aggregate, AggregateOptions, EligibilityFilter, FeedKind, FeedSource, HnClient};
//!
//! let client = Arc::new(HnClient::new(DEFAULT_BASE_URL, Duration::from_secs(10), 10)?);
//! let ids = client.fetch_ids(FeedKind::New).await?;
//! let page = aggregate(client, Arc::new(EligibilityFilter::default()), &ids, &AggregateOptions::default()).await;
//! ```

pub mod aggregator;
pub mod client;
pub mod filter;
pub mod item;
pub mod kind;

pub use aggregator::{aggregate, AggregateOptions};
pub use client::{FeedSource, FetchError, HnClient, DEFAULT_BASE_URL};
pub use filter::{EligibilityFilter, DEFAULT_ALLOWED_HOSTS};
pub use item::{Item, ItemKind, Story};
pub use kind::FeedKind;
