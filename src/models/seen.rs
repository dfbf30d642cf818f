//! Seen-link records and the in-memory dedup state.
//!
//! All timestamps are wall-clock times in UTC+9, stored as
//! `YYYY-MM-DD HH:MM:SS` strings.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout of persisted records.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reference timezone for every seen-link timestamp (UTC+9).
pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).expect("UTC+9 is a valid offset")
}

/// Current time in the reference timezone.
pub fn now_jst() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&jst())
}

/// A link that has been delivered, with the time it was recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeenLink {
    pub link: String,

    #[serde(with = "jst_timestamp")]
    pub timestamp: DateTime<FixedOffset>,
}

impl SeenLink {
    pub fn new(link: impl Into<String>, at: DateTime<FixedOffset>) -> Self {
        Self {
            link: link.into(),
            timestamp: at.with_timezone(&jst()),
        }
    }
}

/// Delivered links per genre.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenState(BTreeMap<String, Vec<SeenLink>>);

impl SeenState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records for `genre`, empty when the genre is unknown.
    pub fn links(&self, genre: &str) -> &[SeenLink] {
        self.0.get(genre).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Set of links already delivered for `genre`.
    pub fn link_set(&self, genre: &str) -> HashSet<&str> {
        self.links(genre).iter().map(|s| s.link.as_str()).collect()
    }

    pub fn contains(&self, genre: &str, link: &str) -> bool {
        self.links(genre).iter().any(|s| s.link == link)
    }

    pub fn genres(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn total(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Make sure `genre` has an entry, even if empty.
    pub fn ensure_genre(&mut self, genre: &str) {
        self.0.entry(genre.to_string()).or_default();
    }

    /// Drop every genre that is not in `valid`. Returns the dropped names.
    pub fn prune_categories(&mut self, valid: &HashSet<&str>) -> Vec<String> {
        let stale: Vec<String> = self
            .0
            .keys()
            .filter(|genre| !valid.contains(genre.as_str()))
            .cloned()
            .collect();
        for genre in &stale {
            self.0.remove(genre);
        }
        stale
    }

    /// Remove records older than `expiration_days`. Returns how many were removed.
    pub fn evict_expired(&mut self, expiration_days: u32) -> usize {
        self.evict_expired_at(expiration_days, now_jst())
    }

    /// Same as [`evict_expired`](Self::evict_expired) with an explicit clock.
    ///
    /// A record survives only if it is strictly newer than `now - expiration_days`.
    pub fn evict_expired_at(&mut self, expiration_days: u32, now: DateTime<FixedOffset>) -> usize {
        let cutoff = now.with_timezone(&jst()) - Duration::days(i64::from(expiration_days));
        let mut removed = 0;
        for links in self.0.values_mut() {
            let before = links.len();
            links.retain(|seen| seen.timestamp > cutoff);
            removed += before - links.len();
        }
        removed
    }

    /// Record `links` as delivered for `genre` at the current time.
    pub fn mark_delivered<'a>(
        &mut self,
        genre: &str,
        links: impl IntoIterator<Item = &'a str>,
    ) -> usize {
        self.mark_delivered_at(genre, links, now_jst())
    }

    /// Same as [`mark_delivered`](Self::mark_delivered) with an explicit clock.
    ///
    /// Links already recorded for the genre are skipped. Returns how many were added.
    pub fn mark_delivered_at<'a>(
        &mut self,
        genre: &str,
        links: impl IntoIterator<Item = &'a str>,
        at: DateTime<FixedOffset>,
    ) -> usize {
        let records = self.0.entry(genre.to_string()).or_default();
        let mut added = 0;
        for link in links {
            if records.iter().any(|seen| seen.link == link) {
                continue;
            }
            records.push(SeenLink::new(link, at));
            added += 1;
        }
        added
    }
}

/// Serde adapter for UTC+9 `YYYY-MM-DD HH:MM:SS` timestamps.
mod jst_timestamp {
    use super::*;
    use serde::{Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(
        at: &DateTime<FixedOffset>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let text = at.with_timezone(&jst()).format(TIMESTAMP_FORMAT).to_string();
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<FixedOffset>, D::Error> {
        let text = String::deserialize(deserializer)?;
        let naive = NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT)
            .map_err(|e| D::Error::custom(format!("bad timestamp '{text}': {e}")))?;
        jst()
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| D::Error::custom(format!("ambiguous timestamp '{text}'")))
    }
}
