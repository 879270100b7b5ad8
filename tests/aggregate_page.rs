//! Integration tests for the feed page: remote feeds served by wiremock,
//! fetched through the shared cache, merged and rendered by the axum router.
//!
//! Each test starts its own mock server and its own app state, so caches
//! never leak between tests.

use std::sync::Arc;

use md_tools::config::Config;
use md_tools::feed::{build_client, Aggregator, FeedCache, FeedFetcher};
use md_tools::server::{self, AppState};
use pretty_assertions::assert_eq;
use tokio::net::TcpListener;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FEED_A: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Feed A</title>
    <item>
        <title>A January</title>
        <link>https://a.example/jan</link>
        <description>&lt;p&gt;first&lt;/p&gt;</description>
        <pubDate>Fri, 01 Jan 2021 00:00:00 GMT</pubDate>
    </item>
    <item>
        <title>A March</title>
        <link>https://a.example/mar</link>
        <description>&lt;p&gt;third&lt;/p&gt;</description>
        <pubDate>Mon, 01 Mar 2021 00:00:00 GMT</pubDate>
    </item>
</channel></rss>"#;

const FEED_B: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Feed B</title>
    <id>urn:b</id>
    <updated>2021-02-01T00:00:00Z</updated>
    <entry>
        <title>B February</title>
        <id>urn:b:1</id>
        <link href="https://b.example/feb"/>
        <updated>2021-02-01T00:00:00Z</updated>
        <summary type="html">&lt;p&gt;second&lt;/p&gt;</summary>
    </entry>
</feed>"#;

const PROLIFIC: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Prolific</title>
    <item><title>P1</title><link>https://p.example/1</link><pubDate>Sat, 01 May 2021 00:00:00 GMT</pubDate></item>
    <item><title>P2</title><link>https://p.example/2</link><pubDate>Sun, 02 May 2021 00:00:00 GMT</pubDate></item>
    <item><title>P3</title><link>https://p.example/3</link><pubDate>Mon, 03 May 2021 00:00:00 GMT</pubDate></item>
    <item><title>P4</title><link>https://p.example/4</link><pubDate>Tue, 04 May 2021 00:00:00 GMT</pubDate></item>
    <item><title>P5</title><link>https://p.example/5</link><pubDate>Wed, 05 May 2021 00:00:00 GMT</pubDate></item>
</channel></rss>"#;

const SCRIPTED: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Scripted</title>
    <item>
        <title>Payload</title>
        <link>https://s.example/x</link>
        <description>&lt;script&gt;alert("x")&lt;/script&gt;&lt;b&gt;bold&lt;/b&gt;</description>
        <pubDate>Mon, 01 Mar 2021 00:00:00 GMT</pubDate>
    </item>
</channel></rss>"#;

async fn mount(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn aggregator() -> Aggregator {
    Aggregator::new(FeedFetcher::new(build_client().unwrap(), FeedCache::new()))
}

/// Serves `config` on an ephemeral port and returns its base URL.
async fn spawn_app(config: Config) -> String {
    let state = Arc::new(AppState::from_config(&config).unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, server::router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

fn titles_in_order(page: &str, titles: &[&str]) -> bool {
    let positions: Vec<usize> = titles.iter().filter_map(|t| page.find(t)).collect();
    positions.len() == titles.len() && positions.windows(2).all(|w| w[0] < w[1])
}

// ============================================================================
// Aggregation
// ============================================================================

#[tokio::test]
async fn test_entries_merged_newest_first_across_feeds() {
    let server = MockServer::start().await;
    mount(&server, "/a", FEED_A).await;
    mount(&server, "/b", FEED_B).await;

    let feeds = vec![
        format!("{}/a", server.uri()),
        format!("{}/b", server.uri()),
    ];
    let items = aggregator().aggregate(&feeds).await;

    let titles: Vec<(&str, &str)> = items
        .iter()
        .map(|item| (item.feed_title.as_str(), item.entry.title.as_str()))
        .collect();
    assert_eq!(
        titles,
        vec![
            ("Feed A", "A March"),
            ("Feed B", "B February"),
            ("Feed A", "A January"),
        ]
    );
}

#[tokio::test]
async fn test_prolific_feed_capped_at_three_entries() {
    let server = MockServer::start().await;
    mount(&server, "/p", PROLIFIC).await;

    let items = aggregator()
        .aggregate(&[format!("{}/p", server.uri())])
        .await;

    let titles: Vec<&str> = items.iter().map(|item| item.entry.title.as_str()).collect();
    assert_eq!(titles, vec!["P3", "P2", "P1"]);
}

#[tokio::test]
async fn test_broken_feed_does_not_hide_others() {
    let server = MockServer::start().await;
    mount(&server, "/a", FEED_A).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    mount(&server, "/garbage", "this is not a feed").await;

    let feeds = vec![
        format!("{}/broken", server.uri()),
        format!("{}/a", server.uri()),
        format!("{}/garbage", server.uri()),
        // Nothing listens here
        "http://127.0.0.1:1/feed".to_string(),
    ];
    let aggregator = aggregator();
    let items = aggregator.aggregate(&feeds).await;

    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item.feed_title == "Feed A"));
    assert_eq!(aggregator.fetcher().cache().len(), 1);
}

#[tokio::test]
async fn test_not_modified_keeps_cached_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .and(header("If-None-Match", "\"a-1\""))
        .respond_with(ResponseTemplate::new(304))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(FEED_A)
                .insert_header("ETag", "\"a-1\""),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let aggregator = aggregator();
    let feeds = vec![format!("{}/a", server.uri())];
    let first = aggregator.aggregate(&feeds).await;
    let second = aggregator.aggregate(&feeds).await;

    assert_eq!(first, second);
    assert_eq!(second.len(), 2);
}

// ============================================================================
// HTTP routes
// ============================================================================

#[tokio::test]
async fn test_feed_page_over_http() {
    let server = MockServer::start().await;
    mount(&server, "/a", FEED_A).await;
    mount(&server, "/b", FEED_B).await;

    let base = spawn_app(Config {
        feeds: vec![
            format!("{}/a", server.uri()),
            format!("{}/b", server.uri()),
        ],
        ..Config::default()
    })
    .await;

    let response = reqwest::get(&base).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"],
        "text/html; charset=utf-8"
    );
    let page = response.text().await.unwrap();

    assert!(page.starts_with("<!doctype html>"));
    assert!(titles_in_order(&page, &["A March", "B February", "A January"]));
    assert!(page.contains("<time>2021-03-01T00:00</time> <i>//</i> <b>Feed A</b>"));
    assert!(page.contains("sandbox=\"allow-forms allow-popups\""));
    assert!(page.contains("<p>second</p>\n</iframe>"));
}

#[tokio::test]
async fn test_unsafe_mode_payload_is_inert() {
    let server = MockServer::start().await;
    mount(&server, "/s", SCRIPTED).await;

    let base = spawn_app(Config {
        feeds: vec![format!("{}/s", server.uri())],
        unsafe_html: true,
        ..Config::default()
    })
    .await;

    let page = reqwest::get(&base).await.unwrap().text().await.unwrap();
    assert!(!page.contains("<script>"));
    assert!(!page.contains("<iframe"));
    assert!(page.contains(
        "<p>&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;&lt;b&gt;bold&lt;/b&gt;</p>"
    ));
}

#[tokio::test]
async fn test_safe_mode_fallback_has_no_markup() {
    let server = MockServer::start().await;
    mount(&server, "/s", SCRIPTED).await;

    let base = spawn_app(Config {
        feeds: vec![format!("{}/s", server.uri())],
        ..Config::default()
    })
    .await;

    let page = reqwest::get(&base).await.unwrap().text().await.unwrap();
    assert!(!page.contains("<script>"));
    assert!(page.contains("<p>bold</p>\n</iframe>"));
}

#[tokio::test]
async fn test_site_routes_absent_unless_configured() {
    let base = spawn_app(Config::default()).await;

    for route in ["/rss.xml", "/sitemap.txt"] {
        let response = reqwest::get(format!("{base}{route}")).await.unwrap();
        assert_eq!(response.status(), 404, "{route}");
    }
}
