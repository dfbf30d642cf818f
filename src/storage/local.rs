//! Local filesystem storage implementation.
//!
//! The state lives in a single JSON document:
//!
//! ```text
//! {
//!   "Games": [
//!     { "link": "https://example.com/a", "timestamp": "2026-10-19 08:00:00" }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::SeenState;
use crate::storage::SeenLinkStorage;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    fn corrupt(&self, message: impl ToString) -> AppError {
        AppError::CorruptStore {
            path: self.path.display().to_string(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl SeenLinkStorage for LocalStorage {
    async fn load(&self) -> Result<SeenState> {
        let Some(bytes) = self.read_bytes().await? else {
            log::info!("No store at {}, starting empty", self.path.display());
            return Ok(SeenState::new());
        };

        let text = std::str::from_utf8(&bytes).map_err(|e| self.corrupt(e))?;
        if text.trim().is_empty() {
            return Ok(SeenState::new());
        }

        let state: Option<SeenState> = serde_json::from_str(text).map_err(|e| self.corrupt(e))?;
        let state = state.unwrap_or_default();
        log::debug!(
            "Loaded {} seen links from {}",
            state.total(),
            self.path.display()
        );
        Ok(state)
    }

    async fn save(&self, state: &SeenState) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(state)?;
        bytes.push(b'\n');
        self.write_bytes(&bytes).await
    }
}
