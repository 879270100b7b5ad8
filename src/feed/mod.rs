//! Remote feed aggregation with conditional-fetch caching.
//!
//! - [`cache`] - process-wide store of the last usable result per feed URL
//! - [`parser`] - RSS/Atom parsing using the `feed-rs` crate
//! - [`fetcher`] - conditional HTTP fetches with fallback to the cache
//! - [`aggregator`] - top entries per feed, merged newest first
//!
//! # Example
//!
//! ```ignore
//! use md_tools::feed::{build_client, Aggregator, FeedCache, FeedFetcher};
//!
//! let fetcher = FeedFetcher::new(build_client()?, FeedCache::new());
//! let items = Aggregator::new(fetcher).aggregate(&feeds).await;
//! ```

pub mod aggregator;
pub mod cache;
pub mod fetcher;
pub mod parser;
mod types;

pub use aggregator::{merge_feeds, Aggregator, ENTRIES_PER_FEED};
pub use cache::{CacheEntry, FeedCache};
pub use fetcher::{build_client, fetch_conditional, FeedFetcher, FetchError, FetchOutcome};
pub use parser::parse_feed;
pub use types::{AggregatedItem, Entry, FeedResult};
