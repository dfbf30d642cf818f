// src/services/feeds.rs

//! Feed aggregation service.
//!
//! Fetches every feed of a genre one after another and turns the entries
//! into [`FeedEntry`] records. A broken feed never stops the others.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{FeedEntry, RawEntry};
use crate::services::{DateResolver, parse_feed_timestamp};

/// Source of raw feed entries for a URL.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>>;
}

/// Fetches feeds over HTTP and parses them with `feed-rs`.
#[derive(Clone)]
pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::feed(url, format!("HTTP {status}")));
        }

        let body = response.bytes().await?;
        // Zone names like JST are not RFC-822, so dates go through our parser.
        let parser = feed_rs::parser::Builder::new()
            .timestamp_parser(parse_feed_timestamp)
            .build();
        let feed = parser.parse(body.as_ref()).map_err(|e| AppError::feed(url, e))?;
        Ok(feed.entries.into_iter().map(RawEntry::from).collect())
    }
}

/// Summary of one aggregation pass.
#[derive(Debug, Default)]
pub struct FeedOutcome {
    /// Normalized entries from all feeds, in no particular cross-feed order
    pub entries: Vec<FeedEntry>,
    pub feed_total: usize,
    pub feed_failures: usize,
    /// Entries dropped because no date could be resolved
    pub undated: usize,
    /// Entries dropped because they had no link
    pub unlinked: usize,
}

/// Service collecting the entries of a genre's feeds.
#[derive(Clone)]
pub struct FeedAggregator {
    source: Arc<dyn FeedSource>,
    resolver: DateResolver,
}

impl FeedAggregator {
    pub fn new(source: Arc<dyn FeedSource>) -> Self {
        Self::with_resolver(source, DateResolver::default())
    }

    pub fn with_resolver(source: Arc<dyn FeedSource>, resolver: DateResolver) -> Self {
        Self { source, resolver }
    }

    /// Fetch every URL in order and normalize what comes back.
    pub async fn collect(&self, urls: &[String]) -> FeedOutcome {
        let mut outcome = FeedOutcome {
            feed_total: urls.len(),
            ..FeedOutcome::default()
        };

        for url in urls {
            log::info!("Fetching feed: {url}");
            let raw_entries = match self.source.fetch(url).await {
                Ok(entries) => entries,
                Err(error) => {
                    outcome.feed_failures += 1;
                    log::warn!("Failed to fetch feed {url}: {error}");
                    continue;
                }
            };

            let before = outcome.entries.len();
            for raw in raw_entries {
                self.normalize(raw, &mut outcome);
            }
            log::debug!(
                "Feed {url}: {} usable entries",
                outcome.entries.len() - before
            );
        }

        outcome
    }

    fn normalize(&self, raw: RawEntry, outcome: &mut FeedOutcome) {
        let Some(published) = self.resolver.resolve(&raw) else {
            outcome.undated += 1;
            return;
        };
        let Some(link) = raw.link else {
            outcome.unlinked += 1;
            return;
        };

        outcome.entries.push(FeedEntry {
            title: raw.title.unwrap_or_default(),
            link,
            published,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StaticSource(HashMap<String, Vec<RawEntry>>);

    #[async_trait]
    impl FeedSource for StaticSource {
        async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| AppError::feed(url, "unreachable"))
        }
    }

    fn dated(link: &str, hour: u32) -> RawEntry {
        RawEntry::new(Some(link.to_uppercase()), Some(link.to_string()))
            .with_parsed("published", Utc.with_ymd_and_hms(2026, 10, 1, hour, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn failing_feed_does_not_stop_others() {
        let mut feeds = HashMap::new();
        feeds.insert("https://a/feed".to_string(), vec![dated("https://a/1", 1)]);
        feeds.insert("https://c/feed".to_string(), vec![dated("https://c/1", 2)]);
        let aggregator = FeedAggregator::new(Arc::new(StaticSource(feeds)));

        let urls = vec![
            "https://a/feed".to_string(),
            "https://broken/feed".to_string(),
            "https://c/feed".to_string(),
        ];
        let outcome = aggregator.collect(&urls).await;

        assert_eq!(outcome.feed_total, 3);
        assert_eq!(outcome.feed_failures, 1);
        let links: Vec<_> = outcome.entries.iter().map(|e| e.link.as_str()).collect();
        assert_eq!(links, vec!["https://a/1", "https://c/1"]);
    }

    #[tokio::test]
    async fn drops_undated_and_unlinked_entries() {
        let mut feeds = HashMap::new();
        feeds.insert(
            "https://a/feed".to_string(),
            vec![
                dated("https://a/1", 1),
                RawEntry::new(Some("no date".into()), Some("https://a/2".into())),
                RawEntry::new(Some("no link".into()), None)
                    .with_raw("pubDate", "Thu, 01 Oct 2026 04:30:00 GMT"),
            ],
        );
        let aggregator = FeedAggregator::new(Arc::new(StaticSource(feeds)));

        let outcome = aggregator.collect(&["https://a/feed".to_string()]).await;

        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.undated, 1);
        assert_eq!(outcome.unlinked, 1);
    }

    #[tokio::test]
    async fn keeps_cross_feed_duplicates() {
        let mut feeds = HashMap::new();
        feeds.insert("https://a/feed".to_string(), vec![dated("https://x/1", 1)]);
        feeds.insert("https://b/feed".to_string(), vec![dated("https://x/1", 2)]);
        let aggregator = FeedAggregator::new(Arc::new(StaticSource(feeds)));

        let outcome = aggregator
            .collect(&["https://a/feed".to_string(), "https://b/feed".to_string()])
            .await;

        assert_eq!(outcome.entries.len(), 2);
    }

    #[tokio::test]
    async fn http_source_parses_rss() {
        let server = MockServer::start().await;
        let body = r#"<?xml version="1.0"?>
            <rss version="2.0"><channel><title>News</title>
            <item><title>One</title><link>https://example.com/1</link>
            <pubDate>Thu, 01 Oct 2026 04:30:00 GMT</pubDate></item>
            <item><title>Two</title><link>https://example.com/2</link></item>
            </channel></rss>"#;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let aggregator = FeedAggregator::new(Arc::new(HttpFeedSource::new(Client::new())));
        let outcome = aggregator.collect(&[format!("{}/rss", server.uri())]).await;

        assert_eq!(outcome.feed_failures, 0);
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.entries[0].title, "One");
        assert_eq!(
            outcome.entries[0].published,
            Utc.with_ymd_and_hms(2026, 10, 1, 4, 30, 0).unwrap()
        );
        assert_eq!(outcome.undated, 1);
    }

    #[tokio::test]
    async fn http_source_reads_zone_named_dates() {
        let server = MockServer::start().await;
        let body = r#"<?xml version="1.0"?>
            <rss version="2.0"><channel><title>News</title>
            <item><title>Local</title><link>https://example.jp/1</link>
            <pubDate>Thu, 01 Oct 2026 10:00:00 JST</pubDate></item>
            </channel></rss>"#;
        Mock::given(method("GET"))
            .and(path("/jp.rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let aggregator = FeedAggregator::new(Arc::new(HttpFeedSource::new(Client::new())));
        let outcome = aggregator.collect(&[format!("{}/jp.rss", server.uri())]).await;

        assert_eq!(outcome.undated, 0);
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(
            outcome.entries[0].published,
            Utc.with_ymd_and_hms(2026, 10, 1, 1, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn http_source_reports_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let source = HttpFeedSource::new(Client::new());
        let err = source.fetch(&format!("{}/rss", server.uri())).await.unwrap_err();
        assert!(matches!(err, AppError::Feed { .. }));
    }

    #[tokio::test]
    async fn http_source_rejects_garbage() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let aggregator = FeedAggregator::new(Arc::new(HttpFeedSource::new(Client::new())));
        let outcome = aggregator.collect(&[server.uri()]).await;
        assert_eq!(outcome.feed_failures, 1);
        assert!(outcome.entries.is_empty());
    }
}
