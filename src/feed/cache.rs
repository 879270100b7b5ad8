use dashmap::DashMap;
use std::sync::Arc;

use super::types::FeedResult;

/// The last usable result for one feed URL, plus the validators needed to
/// ask the server whether it changed.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// `ETag` from the last fresh response, sent back as `If-None-Match`
    pub etag: Option<String>,
    /// Last-modified token, sent back as `If-Modified-Since`
    pub last_modified: Option<String>,
    /// Replaced wholesale on every fresh fetch, never patched in place
    pub feed: Arc<FeedResult>,
}

/// Process-wide store of fetched feeds keyed by feed URL.
///
/// Cloning is cheap and every clone shares the same map. Entries never
/// expire and are never removed: one entry accumulates per distinct feed URL
/// for the lifetime of the process.
///
/// Two concurrent fetches of the same URL race and the last writer wins.
#[derive(Debug, Clone, Default)]
pub struct FeedCache {
    entries: Arc<DashMap<String, CacheEntry>>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the entry for `url`, if any fetch has produced one.
    pub fn get(&self, url: &str) -> Option<CacheEntry> {
        self.entries.get(url).map(|entry| entry.value().clone())
    }

    /// Stores `entry` for `url`, overwriting whatever was there.
    pub fn put(&self, url: &str, entry: CacheEntry) {
        self.entries.insert(url.to_owned(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
