// src/services/webhook.rs

//! Webhook delivery.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::services::DeliveryTarget;

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Posts each message to a fixed channel webhook.
///
/// The webhook answers 204 No Content on success; every other status counts
/// as a failed delivery.
#[derive(Clone)]
pub struct WebhookTarget {
    client: Client,
    url: String,
}

impl WebhookTarget {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl DeliveryTarget for WebhookTarget {
    async fn deliver(&self, genre: &str, content: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { content })
            .send()
            .await
            .map_err(|e| AppError::delivery(format!("webhook for {genre}"), None, e))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::delivery(
            format!("webhook for {genre}"),
            Some(status.as_u16()),
            body,
        ))
    }

    fn describe(&self) -> String {
        // Webhook URLs embed their secret token; keep it out of logs.
        let visible = self.url.rsplit_once('/').map_or(self.url.as_str(), |(head, _)| head);
        format!("webhook {visible}/***")
    }
}
