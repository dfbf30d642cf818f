// src/utils/mod.rs

//! Utility functions.

pub mod http;

pub use http::create_client;
