use anyhow::Result;
use feed_rs::parser;

use super::types::{Entry, FeedResult};

/// Parses RSS or Atom bytes into a [`FeedResult`].
///
/// Entry order is preserved exactly as published. Summaries fall back to the
/// entry's full content body when the feed carries no separate summary.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedResult> {
    let feed = parser::parse(bytes)?;

    let entries: Vec<Entry> = feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry
                .links
                .iter()
                .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
                .or_else(|| entry.links.first())
                .map(|l| l.href.clone())
                .unwrap_or_default();
            let summary_html = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();
            let title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string());

            Entry {
                title,
                link,
                summary_html,
                published_at: entry.published,
                updated_at: entry.updated,
            }
        })
        .collect();

    Ok(FeedResult {
        title: feed
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "Untitled Feed".to_string()),
        updated: feed.updated,
        entries,
    })
}
