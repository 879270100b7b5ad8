use chrono::{DateTime, Utc};

/// A parsed feed: its title and its entries in the order the source published them.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedResult {
    /// Feed-level title, shown next to every entry taken from this feed
    pub title: String,
    /// Feed-level `updated` timestamp, used as a fallback conditional-fetch validator
    pub updated: Option<DateTime<Utc>>,
    /// Entries in source order (not time-sorted)
    pub entries: Vec<Entry>,
}

/// One item of a feed.
///
/// `summary_html` comes straight from a remote source and must be treated as
/// untrusted markup.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub title: String,
    pub link: String,
    pub summary_html: String,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// The timestamp used for ordering: `published_at`, else `updated_at`.
    pub fn effective_date(&self) -> Option<DateTime<Utc>> {
        self.published_at.or(self.updated_at)
    }
}

/// An entry paired with the title of the feed it came from.
///
/// Produced fresh for every request by the aggregator; never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedItem {
    pub entry: Entry,
    pub feed_title: String,
}
