// src/storage/mod.rs

//! Storage abstractions for seen-link persistence.
//!
//! The whole [`SeenState`] is read at the start of a run and written back
//! after every change that must survive a crash.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::SeenState;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for seen-link storage backends.
#[async_trait]
pub trait SeenLinkStorage: Send + Sync {
    /// Load the stored state. A store that does not exist yet loads as empty.
    async fn load(&self) -> Result<SeenState>;

    /// Replace the stored state with `state`.
    async fn save(&self, state: &SeenState) -> Result<()>;
}
