// src/pipeline/run.rs

//! Pipeline entry points.
//!
//! - `run_cleanup`: prune unknown genres and evict expired links
//! - `run_courier`: cleanup, then dispatch every configured genre

use std::sync::Arc;

use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{Config, SeenState};
use crate::pipeline::{Genre, MessageFormatter, NewsDispatcher, RunReport};
use crate::services::{FeedAggregator, HttpFeedSource, build_target};
use crate::storage::SeenLinkStorage;
use crate::utils::create_client;

/// What a cleanup pass changed.
#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    /// Genres dropped because they are no longer configured
    pub pruned: Vec<String>,
    pub evicted: usize,
    pub remaining: usize,
}

/// Load the store, drop unknown genres and expired links, save it back.
///
/// Returns the cleaned state so a dispatch can continue from it. A
/// configuration without genres is refused before the store is touched.
pub async fn run_cleanup(
    config: &Config,
    storage: &dyn SeenLinkStorage,
) -> Result<(SeenState, CleanupReport)> {
    if config.genres.is_empty() {
        return Err(AppError::validation(
            "No genres defined; refusing to clean the store",
        ));
    }

    let mut state = storage.load().await?;

    let pruned = state.prune_categories(&config.genre_names());
    for genre in &pruned {
        log::info!("Dropped unconfigured genre '{genre}' from the store");
    }
    for genre in &config.genres {
        state.ensure_genre(&genre.name);
    }

    let evicted = state.evict_expired(config.expiration_days);
    storage.save(&state).await?;

    let report = CleanupReport {
        pruned,
        evicted,
        remaining: state.total(),
    };
    log::info!(
        "Cleanup: {} expired link(s) removed, {} kept (retention {} days)",
        report.evicted,
        report.remaining,
        config.expiration_days
    );
    Ok((state, report))
}

/// Build dispatchable genres from configuration, in configuration order.
pub fn build_genres(config: &Config, client: &Client) -> Result<Vec<Genre>> {
    config
        .genres
        .iter()
        .map(|genre| {
            Ok(Genre {
                name: genre.name.clone(),
                feeds: genre.feeds.clone(),
                link_style: genre.link_style(),
                target: build_target(&genre.destination, config, client)?,
            })
        })
        .collect()
}

/// Clean the store and deliver everything new.
pub async fn run_courier(config: &Config, storage: Arc<dyn SeenLinkStorage>) -> Result<RunReport> {
    let client = create_client(&config.http)?;
    let genres = build_genres(config, &client)?;
    log::info!("Dispatching {} genre(s)", genres.len());

    let (mut state, _) = run_cleanup(config, storage.as_ref()).await?;

    let dispatcher = NewsDispatcher::new(
        FeedAggregator::new(Arc::new(HttpFeedSource::new(client))),
        storage,
        MessageFormatter::new(config.locale.clone()),
    )
    .with_limits(config.max_entries, config.chunk_size)
    .with_failure_policy(config.failure_policy);

    let report = dispatcher.dispatch(&genres, &mut state).await?;
    log::info!(
        "Run finished: {} link(s) delivered, {} chunk(s) failed",
        report.links_committed(),
        report.chunks_failed()
    );
    Ok(report)
}
