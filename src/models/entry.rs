//! Feed entry data structures.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A normalized feed article ready for filtering and delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,

    /// Article URL; unique key within a genre
    pub link: String,

    /// Best-effort publish time
    pub published: DateTime<Utc>,
}

/// Read access to the date-bearing fields of an entry as a feed library
/// hands it over.
pub trait EntryFields {
    /// Pre-parsed timestamp for `field`, if the library supplied one.
    fn parsed_time(&self, field: &str) -> Option<DateTime<Utc>>;

    /// Raw string value of `field`.
    fn raw_field(&self, field: &str) -> Option<&str>;
}

/// An entry as it comes out of a feed, before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    parsed: HashMap<String, DateTime<Utc>>,
    raw: HashMap<String, String>,
}

impl RawEntry {
    pub fn new(title: Option<String>, link: Option<String>) -> Self {
        Self {
            title,
            link,
            ..Self::default()
        }
    }

    /// Attach a pre-parsed timestamp under `field`.
    pub fn with_parsed(mut self, field: &str, at: DateTime<Utc>) -> Self {
        self.parsed.insert(field.to_string(), at);
        self
    }

    /// Attach a raw string value under `field`.
    pub fn with_raw(mut self, field: &str, value: impl Into<String>) -> Self {
        self.raw.insert(field.to_string(), value.into());
        self
    }
}

impl EntryFields for RawEntry {
    fn parsed_time(&self, field: &str) -> Option<DateTime<Utc>> {
        self.parsed.get(field).copied()
    }

    fn raw_field(&self, field: &str) -> Option<&str> {
        self.raw.get(field).map(String::as_str)
    }
}

impl From<feed_rs::model::Entry> for RawEntry {
    fn from(entry: feed_rs::model::Entry) -> Self {
        let title = entry.title.map(|t| t.content.trim().to_string());
        let link = entry
            .links
            .first()
            .map(|l| l.href.trim().to_string())
            .filter(|href| !href.is_empty());

        let mut raw = RawEntry::new(title, link);
        if let Some(published) = entry.published {
            raw = raw.with_parsed("published", published);
        }
        if let Some(updated) = entry.updated {
            raw = raw.with_parsed("updated", updated);
        }
        raw
    }
}
