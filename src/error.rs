// src/error.rs

//! Unified error handling for the courier.

use std::fmt;

use thiserror::Error;

/// Result type alias for courier operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A feed source could not be fetched or parsed
    #[error("Feed error for {url}: {message}")]
    Feed { url: String, message: String },

    /// The chat platform did not accept a request
    #[error("Delivery error ({context}){}: {message}", status_suffix(.status))]
    Delivery {
        context: String,
        status: Option<u16>,
        message: String,
    },

    /// The persisted seen-link document exists but cannot be read
    #[error("Seen-link store at {path} is corrupt: {message}")]
    CorruptStore { path: String, message: String },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" [HTTP {s}]")).unwrap_or_default()
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a feed error for a source URL.
    pub fn feed(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Feed {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a delivery error with an optional HTTP status.
    pub fn delivery(
        context: impl Into<String>,
        status: Option<u16>,
        message: impl fmt::Display,
    ) -> Self {
        Self::Delivery {
            context: context.into(),
            status,
            message: message.to_string(),
        }
    }

    /// HTTP status attached to a delivery error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Delivery { status, .. } => *status,
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
