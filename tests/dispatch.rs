//! End-to-end dispatch runs against a file-backed store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use tempfile::TempDir;

use rss_courier::error::{AppError, Result};
use rss_courier::models::{FailurePolicy, LinkStyle, LocaleConfig, RawEntry, SeenState, jst};
use rss_courier::pipeline::{Genre, MessageFormatter, NewsDispatcher};
use rss_courier::services::{DeliveryTarget, FeedAggregator, FeedSource};
use rss_courier::storage::{LocalStorage, SeenLinkStorage};

struct Feeds(HashMap<String, Vec<RawEntry>>);

#[async_trait]
impl FeedSource for Feeds {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>> {
        self.0
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::feed(url, "not found"))
    }
}

/// Captures messages and snapshots the store file on every delivery.
struct Capture {
    store: LocalStorage,
    fail_on: Vec<usize>,
    messages: Mutex<Vec<String>>,
    store_sizes: Mutex<Vec<usize>>,
}

impl Capture {
    fn new(store: LocalStorage, fail_on: Vec<usize>) -> Self {
        Self {
            store,
            fail_on,
            messages: Mutex::new(Vec::new()),
            store_sizes: Mutex::new(Vec::new()),
        }
    }

    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryTarget for Capture {
    async fn deliver(&self, genre: &str, content: &str) -> Result<()> {
        let stored = self.store.load().await?.links(genre).len();
        self.store_sizes.lock().unwrap().push(stored);

        let attempt = {
            let mut messages = self.messages.lock().unwrap();
            messages.push(content.to_string());
            messages.len()
        };
        if self.fail_on.contains(&attempt) {
            return Err(AppError::delivery("capture", Some(503), "unavailable"));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "capture".into()
    }
}

fn clock() -> DateTime<FixedOffset> {
    jst().with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, hour, 0, 0).unwrap()
}

fn raw(link: &str, published: DateTime<Utc>) -> RawEntry {
    RawEntry::new(Some(link.to_string()), Some(link.to_string())).with_parsed("published", published)
}

fn dispatcher(feeds: Feeds, store: &LocalStorage, policy: FailurePolicy) -> NewsDispatcher {
    NewsDispatcher::new(
        FeedAggregator::new(Arc::new(feeds)),
        Arc::new(store.clone()),
        MessageFormatter::new(LocaleConfig {
            header_template: "== {genre} ==".into(),
            ..LocaleConfig::default()
        }),
    )
    .with_limits(10, 5)
    .with_failure_policy(policy)
    .with_clock(clock)
}

fn genre(name: &str, feeds: &[&str], target: Arc<Capture>) -> Genre {
    Genre {
        name: name.to_string(),
        feeds: feeds.iter().map(|f| f.to_string()).collect(),
        link_style: LinkStyle::Angle,
        target,
    }
}

#[tokio::test]
async fn duplicate_across_feeds_keeps_latest_and_orders_newest_first() {
    let tmp = TempDir::new().unwrap();
    let store = LocalStorage::new(tmp.path().join("posted.json"));

    // a@T1 and a@T2 come from two feeds, b@T3 from the second one.
    let feeds = Feeds(HashMap::from([
        ("https://one/rss".to_string(), vec![raw("https://x/a", at(1))]),
        (
            "https://two/rss".to_string(),
            vec![raw("https://x/a", at(2)), raw("https://x/b", at(3))],
        ),
    ]));
    let target = Arc::new(Capture::new(store.clone(), vec![]));
    let genre = genre("Games", &["https://one/rss", "https://two/rss"], target.clone());

    let mut state = SeenState::new();
    dispatcher(feeds, &store, FailurePolicy::Abort)
        .dispatch(&[genre], &mut state)
        .await
        .unwrap();

    assert_eq!(
        target.messages(),
        vec!["== Games ==\n\n<https://x/b>\n<https://x/a>".to_string()]
    );
    let saved = store.load().await.unwrap();
    let links: Vec<_> = saved.links("Games").iter().map(|s| s.link.as_str()).collect();
    assert_eq!(links, vec!["https://x/b", "https://x/a"]);
    assert_eq!(saved.links("Games")[0].timestamp, clock());
}

#[tokio::test]
async fn each_chunk_is_saved_before_the_next_is_sent() {
    let tmp = TempDir::new().unwrap();
    let store = LocalStorage::new(tmp.path().join("posted.json"));

    let entries: Vec<RawEntry> = (0..12).map(|i| raw(&format!("https://x/{i}"), at(i))).collect();
    let feeds = Feeds(HashMap::from([("https://rss".to_string(), entries)]));
    let target = Arc::new(Capture::new(store.clone(), vec![]));

    let report = dispatcher(feeds, &store, FailurePolicy::Abort)
        .with_limits(12, 5)
        .dispatch(&[genre("Games", &["https://rss"], target.clone())], &mut SeenState::new())
        .await
        .unwrap();

    assert_eq!(*target.store_sizes.lock().unwrap(), vec![0, 5, 10]);
    assert_eq!(store.load().await.unwrap().links("Games").len(), 12);
    assert_eq!(report.links_committed(), 12);

    let messages = target.messages();
    assert_eq!(messages.len(), 3);
    assert!(messages[0].starts_with("== Games =="));
    assert!(messages[1..].iter().all(|m| !m.contains("==")));
    assert_eq!(messages[2].lines().count(), 2);
}

#[tokio::test]
async fn second_run_delivers_nothing() {
    let tmp = TempDir::new().unwrap();
    let store = LocalStorage::new(tmp.path().join("posted.json"));
    let entries = vec![raw("https://x/a", at(1)), raw("https://x/b", at(2))];
    let target = Arc::new(Capture::new(store.clone(), vec![]));

    for _ in 0..2 {
        let feeds = Feeds(HashMap::from([("https://rss".to_string(), entries.clone())]));
        let mut state = store.load().await.unwrap();
        dispatcher(feeds, &store, FailurePolicy::Abort)
            .dispatch(&[genre("Games", &["https://rss"], target.clone())], &mut state)
            .await
            .unwrap();
    }

    assert_eq!(target.messages().len(), 1);
}

#[tokio::test]
async fn abort_stops_later_genres_and_keeps_failed_links_fresh() {
    let tmp = TempDir::new().unwrap();
    let store = LocalStorage::new(tmp.path().join("posted.json"));
    let feeds = Feeds(HashMap::from([
        ("https://games".to_string(), vec![raw("https://g/1", at(1))]),
        ("https://tech".to_string(), vec![raw("https://t/1", at(1))]),
    ]));
    let target = Arc::new(Capture::new(store.clone(), vec![1]));

    let err = dispatcher(feeds, &store, FailurePolicy::Abort)
        .dispatch(
            &[
                genre("Games", &["https://games"], target.clone()),
                genre("Tech", &["https://tech"], target.clone()),
            ],
            &mut SeenState::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert_eq!(target.messages().len(), 1);
    assert_eq!(store.load().await.unwrap().total(), 0);
}

#[tokio::test]
async fn skip_genre_moves_on_to_the_next_genre() {
    let tmp = TempDir::new().unwrap();
    let store = LocalStorage::new(tmp.path().join("posted.json"));
    let feeds = Feeds(HashMap::from([
        ("https://games".to_string(), vec![raw("https://g/1", at(1))]),
        ("https://tech".to_string(), vec![raw("https://t/1", at(1))]),
    ]));
    let target = Arc::new(Capture::new(store.clone(), vec![1]));

    let report = dispatcher(feeds, &store, FailurePolicy::SkipGenre)
        .dispatch(
            &[
                genre("Games", &["https://games"], target.clone()),
                genre("Tech", &["https://tech"], target.clone()),
            ],
            &mut SeenState::new(),
        )
        .await
        .unwrap();

    assert!(!report.is_complete());
    let saved = store.load().await.unwrap();
    assert!(!saved.contains("Games", "https://g/1"));
    assert!(saved.contains("Tech", "https://t/1"));
}

#[tokio::test]
async fn unreachable_feed_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let store = LocalStorage::new(tmp.path().join("posted.json"));
    let feeds = Feeds(HashMap::from([(
        "https://ok".to_string(),
        vec![raw("https://x/1", at(1))],
    )]));
    let target = Arc::new(Capture::new(store.clone(), vec![]));

    let report = dispatcher(feeds, &store, FailurePolicy::Abort)
        .dispatch(
            &[genre("Games", &["https://down", "https://ok"], target.clone())],
            &mut SeenState::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.genres[0].feed_failures, 1);
    assert_eq!(report.links_committed(), 1);
}
