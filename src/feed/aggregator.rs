use crate::feed::fetcher::FeedFetcher;
use crate::feed::types::{AggregatedItem, FeedResult};
use futures::stream::{self, StreamExt};

/// Entries taken from the head of each feed, so one prolific feed cannot
/// dominate the page.
pub const ENTRIES_PER_FEED: usize = 3;
const MAX_CONCURRENT_FETCHES: usize = 8;

/// Merges several feeds into a single newest-first list.
#[derive(Debug, Clone)]
pub struct Aggregator {
    fetcher: FeedFetcher,
    per_feed: usize,
}

impl Aggregator {
    pub fn new(fetcher: FeedFetcher) -> Self {
        Self {
            fetcher,
            per_feed: ENTRIES_PER_FEED,
        }
    }

    pub fn fetcher(&self) -> &FeedFetcher {
        &self.fetcher
    }

    /// Fetches every feed in `feeds` and merges their entries.
    ///
    /// Feeds are fetched concurrently (up to 8 at once), but results are
    /// consumed in configured order so ties in the final sort stay
    /// deterministic. A feed that yields nothing contributes nothing; this
    /// never fails.
    pub async fn aggregate(&self, feeds: &[String]) -> Vec<AggregatedItem> {
        let fetched: Vec<_> = stream::iter(feeds.iter().cloned())
            .map(|url| {
                let fetcher = self.fetcher.clone();
                async move { fetcher.fetch(&url).await }
            })
            .buffered(MAX_CONCURRENT_FETCHES)
            .collect()
            .await;

        let items = merge_feeds(fetched.iter().flatten().map(|feed| feed.as_ref()), self.per_feed);
        tracing::debug!(
            feeds = feeds.len(),
            available = fetched.iter().flatten().count(),
            items = items.len(),
            "Aggregated feeds"
        );
        items
    }
}

/// Takes the first `per_feed` entries of each feed (source order) and stable
/// sorts the lot by effective date, newest first.
///
/// Entries with no date at all sort after every dated entry.
pub fn merge_feeds<'a>(
    feeds: impl IntoIterator<Item = &'a FeedResult>,
    per_feed: usize,
) -> Vec<AggregatedItem> {
    let mut items: Vec<AggregatedItem> = feeds
        .into_iter()
        .flat_map(|feed| {
            feed.entries
                .iter()
                .take(per_feed)
                .map(move |entry| AggregatedItem {
                    entry: entry.clone(),
                    feed_title: feed.title.clone(),
                })
        })
        .collect();

    // `Option` orders `None` below any `Some`, so descending puts undated last
    items.sort_by(|a, b| b.entry.effective_date().cmp(&a.entry.effective_date()));
    items
}
