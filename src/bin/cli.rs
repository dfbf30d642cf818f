//! rss-courier CLI
//!
//! Local and scheduled execution entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rss_courier::{
    error::Result,
    models::{Config, TIMESTAMP_FORMAT},
    pipeline,
    storage::{LocalStorage, SeenLinkStorage},
};

/// rss-courier - RSS to Discord news courier
#[derive(Parser, Debug)]
#[command(
    name = "rss-courier",
    version,
    about = "Posts new feed articles per genre to Discord"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Seen-link store (default: `store_path` from the configuration)
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean the store, then deliver new articles of every genre
    Run,

    /// Prune unknown genres and evict expired links only
    Clean,

    /// Validate the configuration file
    Validate,

    /// Show per-genre counts of the store
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load(&cli.config)?;
    config.apply_env();
    log::info!("Loaded configuration from {}", cli.config.display());

    let store_path = cli.store.clone().unwrap_or_else(|| config.store_path.clone());
    let storage = Arc::new(LocalStorage::new(&store_path));

    match cli.command {
        Command::Run => {
            config.validate()?;
            let report = pipeline::run_courier(&config, storage).await?;
            if !report.is_complete() {
                log::warn!(
                    "Some chunks were not delivered ({} failed); they will be retried next run",
                    report.chunks_failed()
                );
            }
        }

        Command::Clean => {
            config.validate()?;
            let (_, report) = pipeline::run_cleanup(&config, storage.as_ref()).await?;
            if !report.pruned.is_empty() {
                log::info!("Pruned genres: {}", report.pruned.join(", "));
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} genres, {} feeds)",
                config.genres.len(),
                config.genres.iter().map(|g| g.feeds.len()).sum::<usize>()
            );
        }

        Command::Info => {
            log::info!("Store: {}", store_path.display());
            let state = storage.load().await?;
            if state.total() == 0 {
                log::info!("No links recorded yet.");
            }
            for genre in state.genres() {
                let links = state.links(genre);
                let latest = links
                    .iter()
                    .map(|s| s.timestamp)
                    .max()
                    .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                    .unwrap_or_else(|| "-".into());
                let configured = if config.genre_names().contains(genre) {
                    ""
                } else {
                    " (not configured)"
                };
                log::info!(
                    "{genre}{configured}: {} link(s), latest {latest}",
                    links.len()
                );
            }
        }
    }

    Ok(())
}
