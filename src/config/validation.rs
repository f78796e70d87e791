use crate::config::types::{Config, CrawlerConfig, IntervalConfig, SourceConfig, StorageConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_intervals(&config.intervals)?;
    validate_storage_config(&config.storage)?;
    validate_source_config(&config.source)?;
    validate_crawler_config(&config.crawler)?;
    Ok(())
}

fn validate_intervals(config: &IntervalConfig) -> Result<(), ConfigError> {
    // interval_between_item may be zero; only the cycle cadence must be positive
    if config.interval_between_cycle == 0 {
        return Err(ConfigError::Validation(
            "interval_between_cycle must be > 0ms".to_string(),
        ));
    }

    if config.interval_between_item >= config.interval_between_cycle {
        return Err(ConfigError::Validation(format!(
            "interval_between_item ({}ms) must be shorter than interval_between_cycle ({}ms)",
            config.interval_between_item, config.interval_between_cycle
        )));
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    validate_http_url("board_url", &config.board_url)?;
    validate_http_url("question_url_prefix", &config.question_url_prefix)?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    // Header values cannot carry line breaks
    for (name, value) in [
        ("user_agent", Some(config.user_agent.as_str())),
        ("cookie", config.cookie.as_deref()),
    ] {
        if let Some(value) = value {
            if value.contains(['\r', '\n']) {
                return Err(ConfigError::Validation(format!(
                    "{} must not contain line breaks",
                    name
                )));
            }
        }
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.top == Some(0) {
        return Err(ConfigError::Validation(
            "top must be >= 1 when set".to_string(),
        ));
    }
    Ok(())
}

/// Validates that a URL parses and uses HTTP(S)
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}
