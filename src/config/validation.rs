use crate::config::types::{CloudConfig, Config, CrawlConfig, HttpConfig, OutputConfig, RenderConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_http_config(&config.http)?;
    validate_render_config(&config.render, config.cloud.browser_download)?;
    validate_cloud_config(&config.cloud)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates traversal configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_links_per_page == Some(0) {
        return Err(ConfigError::Validation(
            "max_links_per_page must be >= 1 when set".to_string(),
        ));
    }

    if config.max_html_bytes < 1024 {
        return Err(ConfigError::Validation(format!(
            "max_html_bytes must be >= 1024, got {}",
            config.max_html_bytes
        )));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates rendering configuration
///
/// The browser download fallback navigates with `timeout_ms` too, so the
/// timeout is checked whenever either feature is on.
fn validate_render_config(config: &RenderConfig, browser_download: bool) -> Result<(), ConfigError> {
    if (config.enabled || browser_download) && config.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "render timeout_ms must be >= 1 when rendering or browser downloads are enabled"
                .to_string(),
        ));
    }

    if !config.enabled {
        return Ok(());
    }

    if config.viewport_width == 0 || config.viewport_height == 0 {
        return Err(ConfigError::Validation(format!(
            "viewport must be non-empty, got {}x{}",
            config.viewport_width, config.viewport_height
        )));
    }

    if let Some(selector) = &config.wait_selector {
        if selector.trim().is_empty() {
            return Err(ConfigError::Validation(
                "wait_selector cannot be blank".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates cloud host patterns
fn validate_cloud_config(config: &CloudConfig) -> Result<(), ConfigError> {
    for pattern in config.drive_hosts.iter().chain(&config.docs_hosts) {
        validate_host_pattern(pattern)?;
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a host pattern (supports wildcards)
fn validate_host_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Host pattern cannot be empty".to_string(),
        ));
    }

    let host = pattern.strip_prefix("*.").unwrap_or(pattern);
    validate_host_string(host)
}

/// Validates a host string (without wildcard prefix)
fn validate_host_string(host: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::InvalidPattern("Host cannot be empty".to_string()));
    }

    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') || host.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot start or end with '.' or '-'",
            host
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot contain consecutive dots",
            host
        )));
    }

    Ok(())
}
