//! Views generated from a directory of markdown files.
//!
//! - [`rss`] - RSS 2.0 feed of the markdown posts under a directory
//! - [`sitemap`] - plain-text list of site URLs linked from an index page

pub mod rss;
pub mod sitemap;

use std::path::PathBuf;
use thiserror::Error;

pub use self::rss::{MarkdownFeed, MarkdownPost};
pub use self::sitemap::Sitemap;

/// Errors reading the markdown sources. These fail the current request only.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to walk directory: {0}")]
    Walk(#[from] jwalk::Error),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}
