// src/services/discord.rs

//! Discord REST client for forum threads.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::{AppError, Result};
use crate::models::{ArchiveScope, ThreadHandle};
use crate::services::ThreadApi;

/// Channel type of a public thread.
const PUBLIC_THREAD: u8 = 11;

/// Largest page Discord serves for archived thread listings.
const ARCHIVE_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
struct ThreadList {
    #[serde(default)]
    threads: Vec<ApiThread>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct ApiThread {
    id: String,
    #[serde(default)]
    name: String,
    parent_id: Option<String>,
    thread_metadata: Option<ThreadMetadata>,
}

#[derive(Debug, Deserialize)]
struct ThreadMetadata {
    #[serde(default)]
    archived: bool,
    archive_timestamp: Option<String>,
}

impl ApiThread {
    fn into_handle(self, archived: bool) -> ThreadHandle {
        let archived = archived || self.thread_metadata.is_some_and(|m| m.archived);
        ThreadHandle {
            id: self.id,
            name: self.name,
            parent_id: self.parent_id,
            archived,
        }
    }
}

#[derive(Serialize)]
struct MessageBody<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct CreateThreadBody<'a> {
    name: &'a str,
    auto_archive_duration: u32,
    #[serde(rename = "type")]
    kind: u8,
    message: MessageBody<'a>,
}

#[derive(Serialize)]
struct ArchiveBody {
    archived: bool,
}

/// Bot-authenticated client for the thread endpoints.
#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    api_base: String,
    token: String,
    archive_page_limit: usize,
    auto_archive_minutes: u32,
}

impl DiscordClient {
    pub fn new(client: Client, api_base: &str, token: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            archive_page_limit: 5,
            auto_archive_minutes: 1440,
        }
    }

    /// Maximum pages fetched per archived listing.
    pub fn with_archive_page_limit(mut self, pages: usize) -> Self {
        self.archive_page_limit = pages.max(1);
        self
    }

    /// Auto-archive duration for new threads, in minutes.
    pub fn with_auto_archive_minutes(mut self, minutes: u32) -> Self {
        self.auto_archive_minutes = minutes;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, format!("Bot {}", self.token))
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response> {
        self.authorized(request)
            .send()
            .await
            .map_err(|e| AppError::delivery(context, None, e))
    }

    async fn expect(response: Response, context: &str, accepted: &[StatusCode]) -> Result<Response> {
        let status = response.status();
        if accepted.contains(&status) {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::delivery(context, Some(status.as_u16()), body))
    }

    async fn read_json<T: DeserializeOwned>(response: Response, context: &str) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| AppError::delivery(context, None, format!("unexpected response: {e}")))
    }
}

#[async_trait]
impl ThreadApi for DiscordClient {
    async fn active_threads(&self, guild_id: &str) -> Result<Vec<ThreadHandle>> {
        let context = "list active threads";
        let request = self
            .client
            .get(self.url(&format!("/guilds/{guild_id}/threads/active")));
        let response = Self::expect(self.send(request, context).await?, context, &[StatusCode::OK]).await?;
        let list: ThreadList = Self::read_json(response, context).await?;

        Ok(list
            .threads
            .into_iter()
            .map(|t| t.into_handle(false))
            .collect())
    }

    async fn archived_threads(
        &self,
        channel_id: &str,
        scope: ArchiveScope,
    ) -> Result<Vec<ThreadHandle>> {
        let context = format!("list {} archived threads", scope.as_str());
        let url = self.url(&format!(
            "/channels/{channel_id}/threads/archived/{}",
            scope.as_str()
        ));

        let mut threads = Vec::new();
        let mut before: Option<String> = None;
        for page in 0..self.archive_page_limit {
            let mut query = vec![("limit", ARCHIVE_PAGE_SIZE.to_string())];
            if let Some(ts) = &before {
                query.push(("before", ts.clone()));
            }
            let request = self.client.get(&url).query(&query);
            let response =
                Self::expect(self.send(request, &context).await?, &context, &[StatusCode::OK]).await?;
            let list: ThreadList = Self::read_json(response, &context).await?;

            before = list
                .threads
                .last()
                .and_then(|t| t.thread_metadata.as_ref())
                .and_then(|m| m.archive_timestamp.clone());
            let fetched = list.threads.len();
            threads.extend(list.threads.into_iter().map(|t| t.into_handle(true)));

            if !list.has_more || before.is_none() || fetched == 0 {
                break;
            }
            if page + 1 == self.archive_page_limit {
                log::warn!(
                    "Stopped listing {} archived threads of {channel_id} after {} pages",
                    scope.as_str(),
                    self.archive_page_limit
                );
            }
        }

        log::debug!(
            "{} {} archived threads under {channel_id}",
            threads.len(),
            scope.as_str()
        );
        Ok(threads)
    }

    async fn unarchive(&self, thread_id: &str) -> Result<()> {
        let context = format!("unarchive thread {thread_id}");
        let request = self
            .client
            .patch(self.url(&format!("/channels/{thread_id}")))
            .json(&ArchiveBody { archived: false });
        Self::expect(self.send(request, &context).await?, &context, &[StatusCode::OK]).await?;
        Ok(())
    }

    async fn create_thread(
        &self,
        channel_id: &str,
        name: &str,
        content: &str,
    ) -> Result<ThreadHandle> {
        let context = format!("create thread {name}");
        let body = CreateThreadBody {
            name,
            auto_archive_duration: self.auto_archive_minutes,
            kind: PUBLIC_THREAD,
            message: MessageBody { content },
        };
        let request = self
            .client
            .post(self.url(&format!("/channels/{channel_id}/threads")))
            .json(&body);
        let response = Self::expect(
            self.send(request, &context).await?,
            &context,
            &[StatusCode::OK, StatusCode::CREATED],
        )
        .await?;
        let thread: ApiThread = Self::read_json(response, &context).await?;
        Ok(thread.into_handle(false))
    }

    async fn post_message(&self, thread_id: &str, content: &str) -> Result<()> {
        let context = format!("post to thread {thread_id}");
        let request = self
            .client
            .post(self.url(&format!("/channels/{thread_id}/messages")))
            .json(&MessageBody { content });
        Self::expect(
            self.send(request, &context).await?,
            &context,
            &[StatusCode::OK, StatusCode::CREATED],
        )
        .await?;
        Ok(())
    }
}
