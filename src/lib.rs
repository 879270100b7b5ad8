//! md-tools: dynamic views over remote feeds and a directory of markdown.
//!
//! - [`feed`] - conditional fetching, caching and merging of remote feeds
//! - [`render`] - HTML fragments for aggregated entries
//! - [`site`] - RSS feed and sitemap generated from markdown files
//! - [`server`] - axum routes tying it together

pub mod config;
pub mod feed;
pub mod markdown;
pub mod render;
pub mod server;
pub mod site;
