//! Trendwatch: a trending-board harvester
//!
//! This crate periodically fetches a ranked board of trending items, enriches
//! every entry with a detail fetch, and records each crawl cycle together with
//! the items it produced in a SQLite database.

pub mod config;
pub mod crawler;
pub mod output;
pub mod source;
pub mod storage;

#[cfg(test)]
mod testing;

use thiserror::Error;

/// Main error type for startup and wiring failures
///
/// Errors raised inside a running cycle never reach this type; they are
/// logged and isolated by the orchestrator.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Persistence error: {0}")]
    Persistence(#[from] storage::PersistenceError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Failures of the board or detail source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected status {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("No embedded page state found at {url}")]
    MissingState { url: String },

    #[error("Malformed page state at {url}: {source}")]
    Json {
        url: String,
        source: serde_json::Error,
    },

    #[error("Missing field `{field}` in page state at {url}")]
    MissingField { url: String, field: String },
}

/// Result type alias for Trendwatch operations
pub type Result<T> = std::result::Result<T, WatchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use source::{BoardEntry, DetailRecord, ItemId};
