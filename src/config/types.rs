use serde::Deserialize;

/// Main configuration structure for linkwell
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub storage: StorageConfig,
}

/// Crawl loop behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of uncrawled links claimed per cycle
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Number of workers a batch is partitioned across
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// TCP connect timeout per fetch, in milliseconds
    #[serde(rename = "connect-timeout-ms", default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Whole-request timeout per fetch, in milliseconds
    #[serde(rename = "read-timeout-ms", default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_batch_size() -> usize {
    200
}

fn default_concurrency() -> usize {
    4
}

fn default_connect_timeout_ms() -> u64 {
    3_000
}

fn default_read_timeout_ms() -> u64 {
    10_000
}
