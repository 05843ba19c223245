use crate::config::types::{
    BrowserConfig, Config, CrawlConfig, ProxyConfig, RetrievalConfig, SiteProfile,
};
use crate::url::parse_marker;
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_browser_config(&config.browser)?;
    validate_crawl_config(&config.crawl)?;
    validate_retrieval_config(&config.retrieval)?;
    if let Some(proxy) = &config.proxy {
        validate_proxy_config(proxy)?;
    }
    validate_site_profile(&config.site)?;
    Ok(())
}

/// Validates browser configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.timeout_ms < 1_000 {
        return Err(ConfigError::Validation(format!(
            "timeout-ms must be >= 1000ms, got {}ms",
            config.timeout_ms
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl loop configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.retry_attempts < 1 || config.retry_attempts > 20 {
        return Err(ConfigError::Validation(format!(
            "retry-attempts must be between 1 and 20, got {}",
            config.retry_attempts
        )));
    }

    if config.max_scroll_rounds < 1 {
        return Err(ConfigError::Validation(
            "max-scroll-rounds must be >= 1".to_string(),
        ));
    }

    if let Some(selector) = config.gallery_selectors.iter().find(|s| s.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "gallery-selectors contains an empty selector: '{}'",
            selector
        )));
    }

    Ok(())
}

/// Validates retrieval configuration
fn validate_retrieval_config(config: &RetrievalConfig) -> Result<(), ConfigError> {
    if config.download_root.is_empty() {
        return Err(ConfigError::Validation(
            "download-root cannot be empty".to_string(),
        ));
    }

    if config.min_pacing_ms > config.max_pacing_ms {
        return Err(ConfigError::Validation(format!(
            "min-pacing-ms ({}) must not exceed max-pacing-ms ({})",
            config.min_pacing_ms, config.max_pacing_ms
        )));
    }

    if config.max_bytes == 0 {
        return Err(ConfigError::Validation(
            "max-bytes must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates proxy configuration
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    Url::parse(&config.server)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy server: {}", e)))?;

    if config.password.is_some() && config.username.is_none() {
        return Err(ConfigError::Validation(
            "proxy password given without a username".to_string(),
        ));
    }

    Ok(())
}

/// Validates the site profile
fn validate_site_profile(profile: &SiteProfile) -> Result<(), ConfigError> {
    validate_domain_pattern(&profile.cdn_domain)?;

    Regex::new(&profile.product_host_pattern).map_err(|e| {
        ConfigError::InvalidPattern(format!("product-host-pattern: {}", e))
    })?;

    if !profile.product_path_segment.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "product-path-segment must start with '/', got '{}'",
            profile.product_path_segment
        )));
    }

    if parse_marker(&profile.upgrade_marker).is_none() {
        return Err(ConfigError::InvalidPattern(format!(
            "upgrade-marker '{}' is not a WIDTHxHEIGHT marker",
            profile.upgrade_marker
        )));
    }

    if profile.high_res_markers.is_empty() {
        return Err(ConfigError::Validation(
            "high-res-markers cannot be empty".to_string(),
        ));
    }

    let upgrade_is_high_res = profile
        .high_res_markers
        .iter()
        .any(|m| profile.upgrade_marker.starts_with(m.as_str()));
    if !upgrade_is_high_res {
        // Upgraded URLs would be upgraded again on the next pass
        return Err(ConfigError::Validation(format!(
            "upgrade-marker '{}' must start with one of high-res-markers",
            profile.upgrade_marker
        )));
    }

    for marker in profile
        .high_res_markers
        .iter()
        .chain(&profile.low_res_markers)
        .chain(&profile.ui_size_markers)
    {
        if parse_marker(marker).is_none() {
            return Err(ConfigError::InvalidPattern(format!(
                "'{}' is not a WIDTHxHEIGHT marker",
                marker
            )));
        }
    }

    if let Some(marker) = profile
        .low_res_markers
        .iter()
        .find(|m| profile.ui_size_markers.contains(m))
    {
        return Err(ConfigError::Validation(format!(
            "marker '{}' is listed as both low-res and UI-only",
            marker
        )));
    }

    if profile.image_extensions.is_empty() {
        return Err(ConfigError::Validation(
            "image-extensions cannot be empty".to_string(),
        ));
    }

    if let Some(ext) = profile
        .image_extensions
        .iter()
        .find(|e| e.is_empty() || !e.chars().all(|c| c.is_ascii_alphanumeric()))
    {
        return Err(ConfigError::Validation(format!(
            "image extension '{}' must be alphanumeric without a dot",
            ext
        )));
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);

    if domain.is_empty()
        || !domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            pattern
        )));
    }

    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' has misplaced dots",
            pattern
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'alicdn.com')",
            pattern
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_domain_pattern() {
        assert!(validate_domain_pattern("alicdn.com").is_ok());
        assert!(validate_domain_pattern("*.alicdn.com").is_ok());

        assert!(validate_domain_pattern("").is_err());
        assert!(validate_domain_pattern("*.").is_err());
        assert!(validate_domain_pattern("alicdn").is_err());
        assert!(validate_domain_pattern(".alicdn.com").is_err());
        assert!(validate_domain_pattern("alicdn..com").is_err());
    }

    #[test]
    fn test_rejects_zero_retry_attempts() {
        let mut config = Config::default();
        config.crawl.retry_attempts = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_upgrade_marker_outside_high_res_set() {
        let mut config = Config::default();
        config.site.upgrade_marker = "640x640".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_malformed_marker() {
        let mut config = Config::default();
        config.site.low_res_markers.push("tiny".to_string());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_rejects_overlapping_low_res_and_ui_markers() {
        let mut config = Config::default();
        config.site.ui_size_markers.push("50x50".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_proxy() {
        let mut config = Config::default();
        config.proxy = Some(ProxyConfig {
            server: "not a url".to_string(),
            username: None,
            password: None,
        });
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_bad_host_pattern() {
        let mut config = Config::default();
        config.site.product_host_pattern = "sc(\\d+".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }
}
