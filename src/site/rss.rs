//! RSS 2.0 feed of markdown posts.
//!
//! Each post declares its metadata in plain `key: value` (or `key = value`)
//! lines near the top of the file. Only the first 1024 bytes are inspected.

use ::rss::{ChannelBuilder, GuidBuilder, ItemBuilder};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use jwalk::WalkDir;
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use url::Url;

use super::SiteError;
use crate::config::RssConfig;

const HEADER_BYTES: u64 = 1024;
const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

static RE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*title[ \t]*[:=][ \t]*(.*?)[ \t]*\r?$").unwrap());
static RE_DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*description[ \t]*[:=][ \t]*(.*?)[ \t]*\r?$").unwrap()
});
static RE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*date[ \t]*[:=][ \t]*(.*?)[ \t]*\r?$").unwrap());

/// Metadata of one markdown post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownPost {
    pub url: String,
    /// Date exactly as written in the file; posts sort on this string
    pub date: String,
    pub title: String,
    pub description: String,
}

/// Generates an RSS channel from the markdown files under a directory.
#[derive(Debug, Clone)]
pub struct MarkdownFeed {
    directory: PathBuf,
    title: String,
    link: String,
    description: String,
}

impl MarkdownFeed {
    pub fn new(config: &RssConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            title: config.title.clone(),
            link: config.link.clone(),
            description: config.description.clone(),
        }
    }

    /// Collects every post with both a `date` and a `title`, newest first.
    ///
    /// Posts without a `description` use their title instead.
    pub fn collect_posts(&self) -> Result<Vec<MarkdownPost>, SiteError> {
        let base = Url::parse(&self.link)?;
        std::fs::metadata(&self.directory).map_err(|source| SiteError::Io {
            path: self.directory.clone(),
            source,
        })?;

        let mut posts = Vec::new();

        for entry in WalkDir::new(&self.directory).sort(true) {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || !is_markdown(&path) {
                continue;
            }

            let header = read_header(&path)?;
            let Some(post) = parse_post(&header) else {
                tracing::debug!(path = %path.display(), "Skipping markdown file without title or date");
                continue;
            };

            let relative = path.strip_prefix(&self.directory).unwrap_or(path.as_path());
            let url = base.join(&url_path(relative))?;
            posts.push(MarkdownPost {
                url: url.to_string(),
                date: post.date,
                title: post.title,
                description: post.description,
            });
        }

        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(posts)
    }

    /// Renders the channel as RSS XML, stamped with `build_date`.
    pub fn to_xml(&self, build_date: DateTime<Utc>) -> Result<String, SiteError> {
        let items: Vec<_> = self
            .collect_posts()?
            .into_iter()
            .map(|post| {
                ItemBuilder::default()
                    .title(Some(post.title))
                    .link(Some(post.url.clone()))
                    .guid(Some(
                        GuidBuilder::default()
                            .permalink(true)
                            .value(post.url)
                            .build(),
                    ))
                    .description(Some(post.description))
                    .pub_date(parse_post_date(&post.date).map(|d| d.to_rfc2822()))
                    .build()
            })
            .collect();

        let channel = ChannelBuilder::default()
            .title(self.title.clone())
            .link(self.link.clone())
            .description(self.description.clone())
            .last_build_date(Some(build_date.to_rfc2822()))
            .generator(Some("md-tools".to_string()))
            .items(items)
            .build();

        Ok(channel.to_string())
    }
}

/// Metadata pulled from a post header, before a URL is attached.
struct PostHeader {
    date: String,
    title: String,
    description: String,
}

fn capture(re: &Regex, header: &str) -> Option<String> {
    re.captures(header)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
        .filter(|s| !s.is_empty())
}

fn parse_post(header: &str) -> Option<PostHeader> {
    let date = capture(&RE_DATE, header)?;
    let title = capture(&RE_TITLE, header)?;
    let description = capture(&RE_DESCRIPTION, header).unwrap_or_else(|| title.clone());
    Some(PostHeader {
        date,
        title,
        description,
    })
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MARKDOWN_EXTENSIONS.iter().any(|m| ext.eq_ignore_ascii_case(m)))
}

fn read_header(path: &Path) -> Result<String, SiteError> {
    let io_err = |source| SiteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut bytes = Vec::with_capacity(HEADER_BYTES as usize);
    File::open(path)
        .map_err(io_err)?
        .take(HEADER_BYTES)
        .read_to_end(&mut bytes)
        .map_err(io_err)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Joins path components with `/` regardless of platform.
fn url_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Parses the loosely formatted dates found in post headers.
///
/// Accepts RFC 3339, RFC 2822, `YYYY-MM-DD HH:MM[:SS]` (space or `T`) and
/// `YYYY-MM-DD`. Dates without an offset are taken as UTC.
pub fn parse_post_date(raw: &str) -> Option<DateTime<Utc>> {
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];

    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .ok()
        .map(|d| d.with_timezone(&Utc))
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
                .map(|n| n.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|n| n.and_utc())
        })
}
