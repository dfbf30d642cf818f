// src/pipeline/dispatch.rs

//! Per-genre dispatch: fetch, filter, chunk, deliver, commit.
//!
//! Every delivered chunk is committed to the seen state and saved before the
//! next chunk is attempted, so a crash can at worst lose the record of the
//! chunk in flight. Links of a failed chunk are never committed.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};

use crate::error::Result;
use crate::models::{FailurePolicy, LinkStyle, SeenState, now_jst};
use crate::pipeline::{MessageFormatter, chunk, select_fresh};
use crate::services::{DeliveryTarget, FeedAggregator};
use crate::storage::SeenLinkStorage;

/// A genre ready for dispatch.
#[derive(Clone)]
pub struct Genre {
    pub name: String,
    pub feeds: Vec<String>,
    pub link_style: LinkStyle,
    pub target: Arc<dyn DeliveryTarget>,
}

impl fmt::Debug for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Genre")
            .field("name", &self.name)
            .field("feeds", &self.feeds)
            .field("link_style", &self.link_style)
            .field("target", &self.target.describe())
            .finish()
    }
}

/// How far a genre got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Fetching,
    Filtering,
    Chunking,
    Delivering,
    /// Every attempted chunk was handled; failures, if any, were skipped
    Committed,
    /// Left early under [`FailurePolicy::SkipGenre`]
    Skipped,
    /// Stopped the run under [`FailurePolicy::Abort`]
    Aborted,
}

/// Outcome of one genre.
#[derive(Debug, Clone)]
pub struct GenreReport {
    pub genre: String,
    pub stage: Stage,
    pub fetched: usize,
    pub feed_failures: usize,
    pub fresh: usize,
    pub chunks_delivered: usize,
    pub chunks_failed: usize,
    pub links_committed: usize,
}

impl GenreReport {
    fn new(genre: &str) -> Self {
        Self {
            genre: genre.to_string(),
            stage: Stage::Pending,
            fetched: 0,
            feed_failures: 0,
            fresh: 0,
            chunks_delivered: 0,
            chunks_failed: 0,
            links_committed: 0,
        }
    }

    fn enter(&mut self, stage: Stage) {
        log::debug!("[{}] {:?} -> {:?}", self.genre, self.stage, stage);
        self.stage = stage;
    }

    /// Whether everything selected for this genre was delivered.
    pub fn is_complete(&self) -> bool {
        self.stage == Stage::Committed && self.chunks_failed == 0
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub genres: Vec<GenreReport>,
}

impl RunReport {
    pub fn links_committed(&self) -> usize {
        self.genres.iter().map(|g| g.links_committed).sum()
    }

    pub fn chunks_failed(&self) -> usize {
        self.genres.iter().map(|g| g.chunks_failed).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.genres.iter().all(GenreReport::is_complete)
    }
}

/// Runs genres one after another against a seen state.
pub struct NewsDispatcher {
    aggregator: FeedAggregator,
    storage: Arc<dyn SeenLinkStorage>,
    formatter: MessageFormatter,
    max_entries: usize,
    chunk_size: usize,
    policy: FailurePolicy,
    clock: fn() -> DateTime<FixedOffset>,
}

impl NewsDispatcher {
    pub fn new(
        aggregator: FeedAggregator,
        storage: Arc<dyn SeenLinkStorage>,
        formatter: MessageFormatter,
    ) -> Self {
        Self {
            aggregator,
            storage,
            formatter,
            max_entries: 10,
            chunk_size: 5,
            policy: FailurePolicy::default(),
            clock: now_jst,
        }
    }

    pub fn with_limits(mut self, max_entries: usize, chunk_size: usize) -> Self {
        self.max_entries = max_entries;
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the clock used for headers and commit timestamps.
    pub fn with_clock(mut self, clock: fn() -> DateTime<FixedOffset>) -> Self {
        self.clock = clock;
        self
    }

    /// Dispatch every genre in order.
    ///
    /// Under [`FailurePolicy::Abort`] the first failed chunk ends the run
    /// with its error. Chunks committed before that stay committed.
    pub async fn dispatch(&self, genres: &[Genre], state: &mut SeenState) -> Result<RunReport> {
        let mut run = RunReport::default();
        for genre in genres {
            let report = self.dispatch_genre(genre, state).await?;
            log::info!(
                "[{}] {:?}: {} fresh, {} chunk(s) delivered, {} failed",
                report.genre,
                report.stage,
                report.fresh,
                report.chunks_delivered,
                report.chunks_failed
            );
            run.genres.push(report);
        }
        Ok(run)
    }

    /// Dispatch a single genre.
    pub async fn dispatch_genre(&self, genre: &Genre, state: &mut SeenState) -> Result<GenreReport> {
        let mut report = GenreReport::new(&genre.name);

        report.enter(Stage::Fetching);
        let outcome = self.aggregator.collect(&genre.feeds).await;
        report.fetched = outcome.entries.len();
        report.feed_failures = outcome.feed_failures;
        if outcome.feed_failures == outcome.feed_total && outcome.feed_total > 0 {
            log::warn!("[{}] every feed failed", genre.name);
        }

        report.enter(Stage::Filtering);
        let fresh = select_fresh(outcome.entries, state, &genre.name, self.max_entries);
        report.fresh = fresh.len();
        if fresh.is_empty() {
            log::info!("[{}] nothing new", genre.name);
            report.enter(Stage::Committed);
            return Ok(report);
        }

        report.enter(Stage::Chunking);
        let chunks = chunk(&fresh, self.chunk_size);

        report.enter(Stage::Delivering);
        let mut header_pending = true;
        for (index, entries) in chunks.into_iter().enumerate() {
            let now = (self.clock)();
            let header = header_pending.then(|| self.formatter.header(&genre.name, now));
            let carries_header = header.is_some();
            header_pending = false;

            let content = self
                .formatter
                .compose(header.as_deref(), entries, genre.link_style);

            match genre.target.deliver(&genre.name, &content).await {
                Ok(()) => {
                    let added = state.mark_delivered_at(
                        &genre.name,
                        entries.iter().map(|e| e.link.as_str()),
                        now,
                    );
                    self.storage.save(state).await?;
                    report.chunks_delivered += 1;
                    report.links_committed += added;
                    log::info!(
                        "[{}] chunk {} delivered to {} ({} links)",
                        genre.name,
                        index + 1,
                        genre.target.describe(),
                        entries.len()
                    );
                }
                Err(error) => {
                    report.chunks_failed += 1;
                    log::error!("[{}] chunk {} failed: {error}", genre.name, index + 1);
                    if carries_header {
                        header_pending = true;
                    }
                    match self.policy {
                        FailurePolicy::Abort => {
                            report.enter(Stage::Aborted);
                            return Err(error);
                        }
                        FailurePolicy::SkipGenre => {
                            report.enter(Stage::Skipped);
                            return Ok(report);
                        }
                        FailurePolicy::NextChunk => continue,
                    }
                }
            }
        }

        report.enter(Stage::Committed);
        Ok(report)
    }
}
