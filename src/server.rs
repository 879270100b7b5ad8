//! HTTP surface: the aggregated feed page plus the optional markdown views.
use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::feed::{build_client, Aggregator, FeedCache, FeedFetcher};
use crate::render::{render_page, PageTemplate, RenderMode};
use crate::site::{MarkdownFeed, SiteError, Sitemap};

const HTML: &str = "text/html; charset=utf-8";
const RSS_XML: &str = "application/rss+xml; charset=utf-8";
const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// Everything a request needs, shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub aggregator: Aggregator,
    pub feeds: Vec<String>,
    pub template: PageTemplate,
    pub mode: RenderMode,
    pub rss: Option<MarkdownFeed>,
    pub sitemap: Option<Sitemap>,
}

impl AppState {
    /// Builds the shared state, including the HTTP client and an empty feed
    /// cache that lives as long as the process.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        let client = build_client().context("Failed to build HTTP client")?;
        let fetcher = FeedFetcher::new(client, FeedCache::new()).with_timeout(config.fetch_timeout());

        Ok(Self {
            aggregator: Aggregator::new(fetcher),
            feeds: config.feeds.clone(),
            template: config.page_template().context("Failed to load page template")?,
            mode: config.render_mode(),
            rss: config.rss.as_ref().map(MarkdownFeed::new),
            sitemap: config.sitemap.as_ref().map(Sitemap::new),
        })
    }
}

/// Routes for `state`. `/rss.xml` and `/sitemap.txt` exist only when their
/// section is configured.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new().route("/", get(feed_page));
    if state.rss.is_some() {
        app = app.route("/rss.xml", get(rss_feed));
    }
    if state.sitemap.is_some() {
        app = app.route("/sitemap.txt", get(sitemap));
    }
    app.with_state(state)
}

/// Binds `0.0.0.0:port` and serves until the process is stopped.
pub async fn serve(state: Arc<AppState>, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    tracing::info!(
        addr = %addr,
        feeds = state.feeds.len(),
        mode = ?state.mode,
        rss = state.rss.is_some(),
        sitemap = state.sitemap.is_some(),
        "Server running"
    );

    axum::serve(listener, router(state))
        .await
        .context("Server error")
}

/// `GET /`: fetch, merge and render every configured feed. Always 200.
pub async fn feed_page(State(state): State<Arc<AppState>>) -> Response {
    let items = state.aggregator.aggregate(&state.feeds).await;
    let page = render_page(&items, state.mode, &state.template);
    respond(HTML, page)
}

/// `GET /rss.xml`
pub async fn rss_feed(State(state): State<Arc<AppState>>) -> Response {
    let Some(feed) = state.rss.clone() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let result = tokio::task::spawn_blocking(move || feed.to_xml(Utc::now())).await;
    site_response(RSS_XML, result)
}

/// `GET /sitemap.txt`
pub async fn sitemap(State(state): State<Arc<AppState>>) -> Response {
    let Some(sitemap) = state.sitemap.clone() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let result = tokio::task::spawn_blocking(move || sitemap.render()).await;
    site_response(PLAIN_TEXT, result)
}

fn site_response(
    content_type: &'static str,
    result: Result<Result<String, SiteError>, tokio::task::JoinError>,
) -> Response {
    match result {
        Ok(Ok(body)) => respond(content_type, body),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Failed to render site view");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Site view task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn respond(content_type: &'static str, body: String) -> Response {
    let len = body.len();
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    response
}
