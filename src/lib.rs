// src/lib.rs

//! rss-courier Library
//!
//! Polls RSS/Atom feeds per genre, drops articles that were already
//! announced, and posts the rest to Discord webhooks or forum threads.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
