// src/services/dates.rs

//! Publish-date resolution for raw feed entries.
//!
//! Feeds disagree on where they put the date, so every candidate field is
//! tried in priority order. For each field a value the feed library already
//! parsed wins over the raw string; raw strings are read as RFC-822 dates.

use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

use crate::models::EntryFields;

/// Candidate date fields, highest priority first.
pub const DATE_FIELDS: [&str; 5] = ["published", "updated", "dc:date", "pubDate", "created"];

/// Picks the best available publish timestamp of an entry.
#[derive(Debug, Clone)]
pub struct DateResolver {
    fields: Vec<String>,
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::with_fields(DATE_FIELDS)
    }
}

impl DateResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom candidate list, highest priority first.
    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// First candidate field that yields a timestamp, or `None`.
    pub fn resolve(&self, entry: &impl EntryFields) -> Option<DateTime<Utc>> {
        self.fields
            .iter()
            .find_map(|field| Self::resolve_field(entry, field))
    }

    fn resolve_field(entry: &impl EntryFields, field: &str) -> Option<DateTime<Utc>> {
        if let Some(parsed) = entry.parsed_time(field) {
            return Some(parsed);
        }
        entry.raw_field(field).and_then(parse_rfc822)
    }
}

/// Parse `"<weekday>, <day> <month> <year> <hh>:<mm>:<ss> <zone>"`.
///
/// Numeric offsets and RFC-2822 zone names go through chrono directly.
/// Otherwise the trailing zone is looked up in a small table of
/// abbreviations seen in the wild.
pub fn parse_rfc822(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    static ZONED: OnceLock<Regex> = OnceLock::new();
    let re = ZONED.get_or_init(|| {
        Regex::new(r"^(?P<stamp>.+\d{1,2}:\d{2}:\d{2})\s+(?P<zone>[A-Za-z]{1,5})$")
            .expect("static regex")
    });
    let caps = re.captures(raw)?;
    let offset = zone_offset(&caps["zone"])?;
    let naive = NaiveDateTime::parse_from_str(&caps["stamp"], "%a, %d %b %Y %H:%M:%S").ok()?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Timestamp hook for the feed parser: RFC 3339 (Atom), then RFC-822
/// through [`parse_rfc822`].
pub fn parse_feed_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| parse_rfc822(raw))
}

fn zone_offset(zone: &str) -> Option<FixedOffset> {
    let hours = match zone.to_ascii_uppercase().as_str() {
        "UTC" | "GMT" | "UT" | "Z" => 0,
        "JST" => 9,
        "KST" => 9,
        _ => return None,
    };
    FixedOffset::east_opt(hours * 3600)
}
