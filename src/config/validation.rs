use crate::config::types::{Config, CrawlConfig, OutputConfig, RetryConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_output_config(&config.output)?;
    validate_retry_config(&config.retry)?;
    validate_browser_timeouts(config)?;
    Ok(())
}

/// Validates the crawl target and pacing settings
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_http_url(&config.category_url)?;

    if config.category_label.trim().is_empty() {
        return Err(ConfigError::Validation(
            "category_label cannot be empty".to_string(),
        ));
    }

    if config.page_size < 1 {
        return Err(ConfigError::Validation(format!(
            "page_size must be >= 1, got {}",
            config.page_size
        )));
    }

    if config.fallback_total_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "fallback_total_pages must be >= 1, got {}",
            config.fallback_total_pages
        )));
    }

    if let Some(max_pages) = config.max_pages {
        if max_pages < 1 {
            return Err(ConfigError::Validation(format!(
                "max_pages must be >= 1 when set, got {}",
                max_pages
            )));
        }
    }

    if config.checkpoint_every < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint_every must be >= 1, got {}",
            config.checkpoint_every
        )));
    }

    if config.pause_min_ms > config.pause_max_ms {
        return Err(ConfigError::Validation(format!(
            "pause_min_ms ({}) must not exceed pause_max_ms ({})",
            config.pause_min_ms, config.pause_max_ms
        )));
    }

    if config.product_path_marker.is_empty() {
        return Err(ConfigError::Validation(
            "product_path_marker cannot be empty".to_string(),
        ));
    }

    if config.page_params.is_empty() || config.page_params.iter().any(|p| p.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "page_params must list at least one non-empty parameter name".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "csv_path cannot be empty".to_string(),
        ));
    }

    if config.records_per_page < 1 {
        return Err(ConfigError::Validation(format!(
            "records_per_page must be >= 1, got {}",
            config.records_per_page
        )));
    }

    if let Some(summary) = &config.summary_path {
        if summary.trim().is_empty() {
            return Err(ConfigError::Validation(
                "summary_path cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates the batch retry policy
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.backoff_multiplier < 1.0 {
        return Err(ConfigError::Validation(format!(
            "backoff_multiplier must be >= 1.0, got {}",
            config.backoff_multiplier
        )));
    }

    if config.base_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "base_delay_ms ({}) must not exceed max_delay_ms ({})",
            config.base_delay_ms, config.max_delay_ms
        )));
    }

    Ok(())
}

fn validate_browser_timeouts(config: &Config) -> Result<(), ConfigError> {
    if config.browser.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be > 0".to_string(),
        ));
    }
    Ok(())
}

/// Validates that a URL parses and uses an HTTP(S) scheme
fn validate_http_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid category_url '{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "category_url '{}' must use http or https",
            raw
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("https://www.example.com/cat/soins-visage").is_ok());
        assert!(validate_http_url("http://127.0.0.1:8080/cat").is_ok());

        assert!(validate_http_url("").is_err());
        assert!(validate_http_url("ftp://example.com/cat").is_err());
        assert!(validate_http_url("not a url").is_err());
    }

    #[test]
    fn test_validate_retry_config() {
        assert!(validate_retry_config(&RetryConfig::default()).is_ok());

        let zero_attempts = RetryConfig {
            max_attempts: 0,
            ..RetryConfig::default()
        };
        assert!(validate_retry_config(&zero_attempts).is_err());

        let shrinking = RetryConfig {
            backoff_multiplier: 0.5,
            ..RetryConfig::default()
        };
        assert!(validate_retry_config(&shrinking).is_err());
    }
}
