use crate::feed::cache::{CacheEntry, FeedCache};
use crate::feed::parser::parse_feed;
use crate::feed::types::FeedResult;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest::header::{HeaderMap, ETAG, EXPIRES, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default upper bound on one feed fetch, from sending the request to the
/// last body byte.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Reasons a conditional fetch produced no fresh feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Anything other than 200 or 304
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request and body did not complete within the fetch timeout
    #[error("Request timed out")]
    Timeout,
    /// Feed XML could not be parsed as RSS or Atom
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// What one conditional request told us about a feed.
#[derive(Debug)]
pub enum FetchOutcome {
    /// 200 with a parseable body, along with the validators to store for next time
    Fresh {
        feed: FeedResult,
        etag: Option<String>,
        last_modified: Option<String>,
    },
    /// 304: the cached copy is still current
    NotModified,
    Failed(FetchError),
}

/// Builds the HTTP client used for feed fetches.
pub fn build_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("md-tools/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .build()
}

/// Issues one conditional GET for `url`.
///
/// Validators from `cached` are sent as `If-None-Match` / `If-Modified-Since`.
/// Never returns an error directly: every failure, including the timeout
/// expiring, is reported as [`FetchOutcome::Failed`].
pub async fn fetch_conditional(
    client: &reqwest::Client,
    url: &str,
    cached: Option<&CacheEntry>,
    timeout: Duration,
) -> FetchOutcome {
    match tokio::time::timeout(timeout, request_feed(client, url, cached)).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => FetchOutcome::Failed(e),
        Err(_) => FetchOutcome::Failed(FetchError::Timeout),
    }
}

async fn request_feed(
    client: &reqwest::Client,
    url: &str,
    cached: Option<&CacheEntry>,
) -> Result<FetchOutcome, FetchError> {
    let mut request = client.get(url);
    if let Some(cached) = cached {
        if let Some(etag) = cached.etag.as_deref() {
            request = request.header(IF_NONE_MATCH, etag);
        }
        if let Some(modified) = cached.last_modified.as_deref() {
            request = request.header(IF_MODIFIED_SINCE, modified);
        }
    }

    let response = request.send().await?;
    match response.status() {
        StatusCode::OK => {}
        StatusCode::NOT_MODIFIED => return Ok(FetchOutcome::NotModified),
        status => return Err(FetchError::HttpStatus(status.as_u16())),
    }

    let headers = response.headers().clone();
    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
    let feed = parse_feed(&bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

    let etag = header_string(&headers, ETAG);
    let last_modified = header_string(&headers, LAST_MODIFIED)
        .or_else(|| feed.updated.map(http_date))
        .or_else(|| header_string(&headers, EXPIRES));

    Ok(FetchOutcome::Fresh {
        feed,
        etag,
        last_modified,
    })
}

fn header_string(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// Formats a timestamp as an RFC 7231 HTTP-date.
fn http_date(dt: DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => match expected_length {
                // Connection dropped before the declared length arrived
                Some(expected) if (bytes.len() as u64) < expected => {
                    return Err(FetchError::IncompleteResponse {
                        expected,
                        received: bytes.len(),
                    });
                }
                _ => return Err(FetchError::Network(e)),
            },
        };
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

/// Decides which cache entry survives a fetch.
///
/// A fresh result replaces everything. Otherwise the previous entry is kept
/// as-is, validators included. `None` means there is nothing to show.
fn resolve(url: &str, outcome: FetchOutcome, cached: Option<CacheEntry>) -> Option<CacheEntry> {
    match outcome {
        FetchOutcome::Fresh {
            feed,
            etag,
            last_modified,
        } => {
            tracing::debug!(feed = %url, entries = feed.entries.len(), "Fetched fresh feed");
            Some(CacheEntry {
                etag,
                last_modified,
                feed: Arc::new(feed),
            })
        }
        FetchOutcome::NotModified => {
            tracing::debug!(feed = %url, "Feed not modified, using cached copy");
            cached
        }
        FetchOutcome::Failed(FetchError::HttpStatus(status)) => {
            tracing::warn!(feed = %url, status = status, "Site error");
            cached
        }
        FetchOutcome::Failed(e) => {
            tracing::warn!(feed = %url, error = %e, "Feed fetch failed");
            cached
        }
    }
}

/// Fetches feeds through a shared [`FeedCache`], falling back to the cached
/// copy whenever a fetch is not fresh.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
    cache: FeedCache,
    timeout: Duration,
}

impl FeedFetcher {
    pub fn new(client: reqwest::Client, cache: FeedCache) -> Self {
        Self {
            client,
            cache,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    /// Returns the best available copy of the feed at `url`.
    ///
    /// # Behavior
    ///
    /// - 200: the new feed is cached with its validators and returned
    /// - 304, other statuses, network/parse errors, timeout: the cached feed
    ///   is returned unchanged
    /// - Not fresh and nothing cached: `None`, and the cache stays empty for `url`
    pub async fn fetch(&self, url: &str) -> Option<Arc<FeedResult>> {
        let cached = self.cache.get(url);
        let outcome = fetch_conditional(&self.client, url, cached.as_ref(), self.timeout).await;

        match resolve(url, outcome, cached) {
            Some(entry) => {
                let feed = Arc::clone(&entry.feed);
                self.cache.put(url, entry);
                Some(feed)
            }
            None => {
                tracing::info!(feed = %url, "No cache hit and no data, skipping feed");
                None
            }
        }
    }
}
