//! Linkwell: a batch-cycling link crawler
//!
//! This crate implements a crawler that claims bounded batches of uncrawled
//! URLs from a durable SQLite store, fans each batch out across a worker pool,
//! harvests absolute links from the fetched pages, and commits discoveries and
//! completions back to the store at cycle boundaries.

pub mod config;
pub mod crawler;
pub mod storage;
pub mod transfer;

use thiserror::Error;

/// Main error type for linkwell operations
#[derive(Debug, Error)]
pub enum LinkwellError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] crawler::DispatchError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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
}

/// Result type alias for linkwell operations
pub type Result<T> = std::result::Result<T, LinkwellError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlDispatcher, CrawlSnapshot, PageFetcher, RunState};
pub use storage::{LinkRecord, LinkStore, SqliteStore};
