// src/services/mod.rs

//! Service layer for the courier.
//!
//! This module contains the business logic for:
//! - Feed fetching and normalization (`FeedAggregator`)
//! - Publish-date resolution (`DateResolver`)
//! - Delivery to webhooks and forum threads (`DeliveryTarget`)

mod dates;
mod delivery;
mod discord;
mod feeds;
mod forum;
mod webhook;

pub use dates::{DATE_FIELDS, DateResolver, parse_feed_timestamp, parse_rfc822};
pub use delivery::{DeliveryTarget, build_target};
pub use discord::DiscordClient;
pub use feeds::{FeedAggregator, FeedOutcome, FeedSource, HttpFeedSource};
pub use forum::{ForumThreadTarget, ThreadApi};
pub use webhook::WebhookTarget;
