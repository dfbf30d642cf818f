// src/models/mod.rs

//! Domain models for the courier.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod entry;
mod seen;
mod thread;

// Re-export all public types
pub use config::{
    BOT_TOKEN_ENV, Config, Destination, DiscordConfig, FailurePolicy, GenreConfig, HttpConfig,
    LinkStyle, LocaleConfig,
};
pub use entry::{EntryFields, FeedEntry, RawEntry};
pub use seen::{SeenLink, SeenState, TIMESTAMP_FORMAT, jst, now_jst};
pub use thread::{ArchiveScope, ThreadHandle};
