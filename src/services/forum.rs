// src/services/forum.rs

//! Forum thread delivery.
//!
//! Each genre owns one thread in a forum channel, matched by exact name on
//! every run. Nothing about the thread is persisted between runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::{ArchiveScope, ThreadHandle};
use crate::services::DeliveryTarget;

/// Thread operations of the chat platform.
#[async_trait]
pub trait ThreadApi: Send + Sync {
    /// Active threads of the whole guild.
    async fn active_threads(&self, guild_id: &str) -> Result<Vec<ThreadHandle>>;

    /// Archived threads under `channel_id`.
    async fn archived_threads(
        &self,
        channel_id: &str,
        scope: ArchiveScope,
    ) -> Result<Vec<ThreadHandle>>;

    async fn unarchive(&self, thread_id: &str) -> Result<()>;

    /// Create a thread under `channel_id` whose first message is `content`.
    async fn create_thread(&self, channel_id: &str, name: &str, content: &str)
    -> Result<ThreadHandle>;

    async fn post_message(&self, thread_id: &str, content: &str) -> Result<()>;
}

/// Delivers into the forum thread named after the genre, creating it when
/// missing and unarchiving it when needed.
pub struct ForumThreadTarget {
    api: Arc<dyn ThreadApi>,
    guild_id: String,
    channel_id: String,
    include_private: bool,
    new_thread_message: String,
    /// Threads resolved during this run, by genre
    resolved: Mutex<HashMap<String, String>>,
}

impl ForumThreadTarget {
    pub fn new(
        api: Arc<dyn ThreadApi>,
        guild_id: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            guild_id: guild_id.into(),
            channel_id: channel_id.into(),
            include_private: false,
            new_thread_message: "{genre}".into(),
            resolved: Mutex::new(HashMap::new()),
        }
    }

    /// Also search privately archived threads.
    pub fn include_private_archived(mut self, include: bool) -> Self {
        self.include_private = include;
        self
    }

    /// Body used when a thread must be created without content.
    pub fn with_new_thread_message(mut self, template: impl Into<String>) -> Self {
        self.new_thread_message = template.into();
        self
    }

    /// Find the thread named `genre` among active and archived threads of
    /// the forum channel.
    pub async fn find_thread(&self, genre: &str) -> Result<Option<ThreadHandle>> {
        let mut candidates: Vec<ThreadHandle> = self
            .api
            .active_threads(&self.guild_id)
            .await?
            .into_iter()
            .filter(|t| t.is_child_of(&self.channel_id))
            .collect();

        let mut scopes = vec![ArchiveScope::Public];
        if self.include_private {
            scopes.push(ArchiveScope::Private);
        }
        for scope in scopes {
            let archived = self.api.archived_threads(&self.channel_id, scope).await?;
            candidates.extend(
                archived
                    .into_iter()
                    .filter(|t| t.parent_id.is_none() || t.is_child_of(&self.channel_id)),
            );
        }

        let found = candidates.into_iter().find(|t| t.name == genre);
        match &found {
            Some(t) => log::info!(
                "Found thread '{}' (id {}, archived: {})",
                t.name,
                t.id,
                t.archived
            ),
            None => log::info!("No thread named '{genre}' in forum {}", self.channel_id),
        }
        Ok(found)
    }

    async fn cached(&self, genre: &str) -> Option<String> {
        self.resolved.lock().await.get(genre).cloned()
    }

    async fn remember(&self, genre: &str, thread_id: &str) {
        self.resolved
            .lock()
            .await
            .insert(genre.to_string(), thread_id.to_string());
    }
}

#[async_trait]
impl DeliveryTarget for ForumThreadTarget {
    async fn deliver(&self, genre: &str, content: &str) -> Result<()> {
        if let Some(thread_id) = self.cached(genre).await {
            return self.api.post_message(&thread_id, content).await;
        }

        match self.find_thread(genre).await? {
            Some(thread) => {
                // Never post into a thread that may still be archived.
                if thread.archived {
                    self.api.unarchive(&thread.id).await?;
                    log::info!("Unarchived thread '{}' ({})", thread.name, thread.id);
                }
                self.remember(genre, &thread.id).await;
                self.api.post_message(&thread.id, content).await
            }
            None => {
                let body = if content.trim().is_empty() {
                    self.new_thread_message.replace("{genre}", genre)
                } else {
                    content.to_string()
                };
                let created = self
                    .api
                    .create_thread(&self.channel_id, genre, &body)
                    .await?;
                log::info!("Created thread '{}' ({})", created.name, created.id);
                self.remember(genre, &created.id).await;
                Ok(())
            }
        }
    }

    fn describe(&self) -> String {
        format!("forum {} in guild {}", self.channel_id, self.guild_id)
    }
}
