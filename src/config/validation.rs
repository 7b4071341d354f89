use crate::config::types::{Config, CrawlerConfig, StorageConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates crawler configuration
///
/// Concurrency is deliberately not checked here: it can be changed while a
/// run is live, so the dispatcher enforces it at the top of every cycle
/// instead.
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch-size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.connect_timeout_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-ms must be >= 1, got {}",
            config.connect_timeout_ms
        )));
    }

    if config.read_timeout_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "read-timeout-ms must be >= 1, got {}",
            config.read_timeout_ms
        )));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
