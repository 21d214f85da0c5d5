use crate::config::types::{Config, CrawlerConfig, HttpConfig, SearchConfig, TargetsConfig};
use crate::search::KNOWN_ADAPTERS;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    validate_search_config(&config.search)?;
    validate_targets(&config.targets)?;
    Ok(())
}

/// Validates pacing and filtering settings
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_seconds("default-delay", config.default_delay)?;
    validate_seconds("jitter-min", config.jitter_min)?;
    validate_seconds("jitter-max", config.jitter_max)?;
    validate_seconds("backoff-base", config.backoff_base)?;

    if config.jitter_min > config.jitter_max {
        return Err(ConfigError::Validation(format!(
            "jitter-min ({}) must not exceed jitter-max ({})",
            config.jitter_min, config.jitter_max
        )));
    }

    if !(0.0..=1.0).contains(&config.relevance_threshold) {
        return Err(ConfigError::Validation(format!(
            "relevance-threshold must be between 0.0 and 1.0, got {}",
            config.relevance_threshold
        )));
    }

    if config.max_comment_pages < 1 {
        return Err(ConfigError::Validation(
            "max-comment-pages must be >= 1".to_string(),
        ));
    }

    for (domain, delay) in &config.domain_delays {
        validate_domain_string(domain)?;
        validate_seconds(&format!("domain-delays.\"{}\"", domain), *delay)?;
    }

    Ok(())
}

/// Validates HTTP client settings
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.connect_timeout == 0 || config.read_timeout == 0 {
        return Err(ConfigError::Validation(
            "connect-timeout and read-timeout must be > 0".to_string(),
        ));
    }

    if config.user_agents.is_empty() {
        return Err(ConfigError::Validation(
            "user-agents cannot be empty".to_string(),
        ));
    }

    // Target sites reject anything that does not look like a browser
    for agent in &config.user_agents {
        if !agent.starts_with("Mozilla/") {
            return Err(ConfigError::Validation(format!(
                "user agent '{}' does not look like a browser",
                agent
            )));
        }
    }

    Ok(())
}

/// Validates search adapter names and board URLs
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.adapters.is_empty() {
        return Err(ConfigError::Validation(
            "at least one search adapter must be configured".to_string(),
        ));
    }

    for name in &config.adapters {
        if !KNOWN_ADAPTERS.contains(&name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "unknown search adapter '{}' (expected one of {:?})",
                name, KNOWN_ADAPTERS
            )));
        }
    }

    if config.max_results_per_site < 1 {
        return Err(ConfigError::Validation(
            "max-results-per-site must be >= 1".to_string(),
        ));
    }

    for (domain, board) in &config.boards {
        validate_domain_string(domain)?;
        let url = Url::parse(board).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid board URL '{}': {}", board, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Board URL '{}' must use http or https",
                board
            )));
        }
    }

    Ok(())
}

fn validate_targets(targets: &TargetsConfig) -> Result<(), ConfigError> {
    if targets.keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "keywords cannot contain blank entries".to_string(),
        ));
    }

    for site in &targets.sites {
        validate_domain_string(site)?;
    }

    Ok(())
}

/// Longest pause any pacing setting may ask for
const MAX_SECONDS: f64 = 86_400.0;

fn validate_seconds(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be a non-negative number of seconds, got {}",
            name, value
        )));
    }
    if value > MAX_SECONDS {
        return Err(ConfigError::Validation(format!(
            "{} must be at most {} seconds, got {}",
            name, MAX_SECONDS, value
        )));
    }
    Ok(())
}

/// Validates a bare domain such as `dcinside.com`
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
        || domain.contains("..")
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' is malformed",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'ruliweb.com')",
            domain
        )));
    }

    Ok(())
}
