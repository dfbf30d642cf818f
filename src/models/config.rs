//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Environment variable holding the Discord bot token.
pub const BOT_TOKEN_ENV: &str = "DISCORD_BOT_TOKEN";

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Days a delivered link is remembered before it may be posted again
    #[serde(default = "defaults::expiration_days")]
    pub expiration_days: u32,

    /// Newest entries considered per genre and run
    #[serde(default = "defaults::max_entries")]
    pub max_entries: usize,

    /// Entries per posted message
    #[serde(default = "defaults::chunk_size")]
    pub chunk_size: usize,

    /// What to do when a chunk cannot be delivered
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Location of the seen-link document
    #[serde(default = "defaults::store_path")]
    pub store_path: PathBuf,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Discord API settings for forum delivery
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Message texts
    #[serde(default)]
    pub locale: LocaleConfig,

    /// Genre definitions, processed in order
    #[serde(default)]
    pub genres: Vec<GenreConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Fill the bot token from the environment when the file leaves it out.
    pub fn apply_env(&mut self) {
        if self.discord.bot_token.is_none() {
            self.discord.bot_token = std::env::var(BOT_TOKEN_ENV)
                .ok()
                .filter(|token| !token.trim().is_empty());
        }
    }

    /// Names of all configured genres.
    pub fn genre_names(&self) -> HashSet<&str> {
        self.genres.iter().map(|g| g.name.as_str()).collect()
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.expiration_days == 0 {
            return Err(AppError::validation("expiration_days must be > 0"));
        }
        if self.max_entries == 0 {
            return Err(AppError::validation("max_entries must be > 0"));
        }
        if self.chunk_size == 0 {
            return Err(AppError::validation("chunk_size must be > 0"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.locale.weekdays.len() != 7 {
            return Err(AppError::validation(
                "locale.weekdays must list 7 names starting with Sunday",
            ));
        }
        if self.genres.is_empty() {
            return Err(AppError::validation("No genres defined"));
        }

        let mut names = HashSet::new();
        for genre in &self.genres {
            if genre.name.trim().is_empty() {
                return Err(AppError::validation("genre name is empty"));
            }
            if !names.insert(genre.name.as_str()) {
                return Err(AppError::validation(format!(
                    "genre '{}' is defined twice",
                    genre.name
                )));
            }
            if genre.feeds.is_empty() {
                return Err(AppError::validation(format!(
                    "genre '{}' has no feeds",
                    genre.name
                )));
            }
            for feed in &genre.feeds {
                Url::parse(feed).map_err(|e| {
                    AppError::validation(format!("genre '{}': bad feed URL {feed}: {e}", genre.name))
                })?;
            }
            match &genre.destination {
                Destination::Webhook { url } => {
                    Url::parse(url).map_err(|e| {
                        AppError::validation(format!(
                            "genre '{}': bad webhook URL: {e}",
                            genre.name
                        ))
                    })?;
                }
                Destination::Forum {
                    guild_id,
                    channel_id,
                } => {
                    if guild_id.trim().is_empty() || channel_id.trim().is_empty() {
                        return Err(AppError::validation(format!(
                            "genre '{}': forum destination needs guild_id and channel_id",
                            genre.name
                        )));
                    }
                    if self.discord.bot_token.is_none() {
                        return Err(AppError::validation(format!(
                            "genre '{}' posts to a forum but no bot token is set ({BOT_TOKEN_ENV})",
                            genre.name
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            expiration_days: defaults::expiration_days(),
            max_entries: defaults::max_entries(),
            chunk_size: defaults::chunk_size(),
            failure_policy: FailurePolicy::default(),
            store_path: defaults::store_path(),
            http: HttpConfig::default(),
            discord: DiscordConfig::default(),
            locale: LocaleConfig::default(),
            genres: Vec::new(),
        }
    }
}

/// Reaction to a chunk that could not be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the whole run with an error
    #[default]
    Abort,
    /// Give up on the current genre and continue with the next one
    SkipGenre,
    /// Keep trying the remaining chunks of the genre
    NextChunk,
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Discord REST settings used by forum destinations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Bot token; usually supplied through `DISCORD_BOT_TOKEN`
    #[serde(default, skip_serializing)]
    pub bot_token: Option<String>,

    /// Auto-archive duration for newly created threads, in minutes
    #[serde(default = "defaults::auto_archive_minutes")]
    pub auto_archive_minutes: u32,

    /// Also search privately archived threads (needs MANAGE_THREADS)
    #[serde(default)]
    pub include_private_archived: bool,

    /// Maximum pages fetched per archived-thread listing
    #[serde(default = "defaults::archive_page_limit")]
    pub archive_page_limit: usize,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::api_base(),
            bot_token: None,
            auto_archive_minutes: defaults::auto_archive_minutes(),
            include_private_archived: false,
            archive_page_limit: defaults::archive_page_limit(),
        }
    }
}

/// Message texts used when composing posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleConfig {
    /// Header for the first message of a genre.
    ///
    /// Placeholders: `{month}`, `{day}`, `{weekday}`, `{hour}`, `{genre}`
    #[serde(default = "defaults::header_template")]
    pub header_template: String,

    /// Weekday names starting with Sunday
    #[serde(default = "defaults::weekdays")]
    pub weekdays: Vec<String>,

    /// Body used when a thread has to be created without content.
    ///
    /// Placeholder: `{genre}`
    #[serde(default = "defaults::new_thread_message")]
    pub new_thread_message: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            header_template: defaults::header_template(),
            weekdays: defaults::weekdays(),
            new_thread_message: defaults::new_thread_message(),
        }
    }
}

/// A named group of feeds sharing one destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreConfig {
    pub name: String,

    /// Feed URLs, fetched in order
    pub feeds: Vec<String>,

    pub destination: Destination,

    /// Overrides the destination's default link formatting
    #[serde(default)]
    pub link_style: Option<LinkStyle>,
}

impl GenreConfig {
    /// Link style for this genre's messages.
    pub fn link_style(&self) -> LinkStyle {
        self.link_style.unwrap_or(match self.destination {
            Destination::Webhook { .. } => LinkStyle::Angle,
            Destination::Forum { .. } => LinkStyle::Markdown,
        })
    }
}

/// Where a genre's messages go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Destination {
    /// Post straight to a channel webhook
    Webhook { url: String },
    /// Post into a thread named after the genre inside a forum channel
    Forum { guild_id: String, channel_id: String },
}

/// How each link is written into a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStyle {
    /// `<url>`: clickable, no embed preview
    Angle,
    /// `[_](url)`: masked link
    Markdown,
}

mod defaults {
    use std::path::PathBuf;

    pub fn expiration_days() -> u32 {
        3
    }
    pub fn max_entries() -> usize {
        10
    }
    pub fn chunk_size() -> usize {
        5
    }
    pub fn store_path() -> PathBuf {
        PathBuf::from("data/posted_links.json")
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; rss-courier/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Discord defaults
    pub fn api_base() -> String {
        "https://discord.com/api/v10".into()
    }
    pub fn auto_archive_minutes() -> u32 {
        1440
    }
    pub fn archive_page_limit() -> usize {
        5
    }

    // Locale defaults
    pub fn header_template() -> String {
        "**{month}月{day}日({weekday}) {hour}時 最新ニュース（{genre}）**".into()
    }
    pub fn weekdays() -> Vec<String> {
        ["日", "月", "火", "水", "木", "金", "土"]
            .iter()
            .map(|d| d.to_string())
            .collect()
    }
    pub fn new_thread_message() -> String {
        "スレッド（{genre}）を新規に自動生成しました。".into()
    }
}
