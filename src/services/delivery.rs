// src/services/delivery.rs

//! Delivery targets.
//!
//! A genre posts either straight to a webhook or into a forum thread named
//! after the genre. Both sit behind [`DeliveryTarget`]; the variant is chosen
//! once, when genres are built from configuration.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{Config, Destination};
use crate::services::{DiscordClient, ForumThreadTarget, WebhookTarget};

/// Somewhere a formatted message can be posted.
#[async_trait]
pub trait DeliveryTarget: Send + Sync {
    /// Post `content` for `genre`. `Ok` means the platform accepted it.
    async fn deliver(&self, genre: &str, content: &str) -> Result<()>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Build the delivery target for a destination.
pub fn build_target(
    destination: &Destination,
    config: &Config,
    client: &Client,
) -> Result<Arc<dyn DeliveryTarget>> {
    match destination {
        Destination::Webhook { url } => Ok(Arc::new(WebhookTarget::new(client.clone(), url))),
        Destination::Forum {
            guild_id,
            channel_id,
        } => {
            let token = config.discord.bot_token.as_deref().ok_or_else(|| {
                AppError::config("forum destination requires a Discord bot token")
            })?;
            let api = DiscordClient::new(client.clone(), &config.discord.api_base, token)
                .with_archive_page_limit(config.discord.archive_page_limit)
                .with_auto_archive_minutes(config.discord.auto_archive_minutes);
            Ok(Arc::new(
                ForumThreadTarget::new(Arc::new(api), guild_id, channel_id)
                    .include_private_archived(config.discord.include_private_archived)
                    .with_new_thread_message(&config.locale.new_thread_message),
            ))
        }
    }
}
