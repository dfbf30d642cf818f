// src/pipeline/mod.rs

//! Pipeline for courier runs.
//!
//! - `select`: pick fresh entries and split them into chunks
//! - `message`: render headers and link lines
//! - `dispatch`: per-genre state machine with commit-per-chunk
//! - `run`: cleanup and full-run entry points

pub mod dispatch;
pub mod message;
pub mod run;
pub mod select;

pub use dispatch::{Genre, GenreReport, NewsDispatcher, RunReport, Stage};
pub use message::{MessageFormatter, link_markup};
pub use run::{CleanupReport, build_genres, run_cleanup, run_courier};
pub use select::{chunk, select_fresh};
