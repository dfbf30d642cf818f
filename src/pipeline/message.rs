// src/pipeline/message.rs

//! Message composition.

use chrono::{DateTime, Datelike, FixedOffset, Timelike};

use crate::models::{FeedEntry, LinkStyle, LocaleConfig, jst};

/// Builds message bodies from chunks of entries.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    locale: LocaleConfig,
}

impl MessageFormatter {
    pub fn new(locale: LocaleConfig) -> Self {
        Self { locale }
    }

    /// Header for `genre` at `at`, rendered in UTC+9.
    pub fn header(&self, genre: &str, at: DateTime<FixedOffset>) -> String {
        let at = at.with_timezone(&jst());
        // `Config::validate` requires 7 names, Sunday first; anything
        // shorter falls back to chrono's English abbreviation.
        let weekday = self
            .locale
            .weekdays
            .get(at.weekday().num_days_from_sunday() as usize)
            .cloned()
            .unwrap_or_else(|| at.weekday().to_string());

        self.locale
            .header_template
            .replace("{month}", &at.month().to_string())
            .replace("{day}", &at.day().to_string())
            .replace("{weekday}", &weekday)
            .replace("{hour}", &at.hour().to_string())
            .replace("{genre}", genre)
    }

    /// Body for one chunk, prefixed by `header` when given.
    pub fn compose(&self, header: Option<&str>, entries: &[FeedEntry], style: LinkStyle) -> String {
        let links = entries.iter().map(|e| link_markup(&e.link, style));
        let body = match style {
            LinkStyle::Angle => links.collect::<Vec<_>>().join("\n"),
            LinkStyle::Markdown => links.collect::<Vec<_>>().join(" "),
        };

        match header {
            Some(header) => format!("{header}\n\n{body}"),
            None => body,
        }
    }
}

/// A single link as it appears in a message.
pub fn link_markup(url: &str, style: LinkStyle) -> String {
    match style {
        LinkStyle::Angle => format!("<{url}>"),
        LinkStyle::Markdown => format!("[_]({url})"),
    }
}
