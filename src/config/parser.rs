use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable consulted when `google-api-key` is absent
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Environment variable consulted when `google-cse-id` is absent
pub const GOOGLE_CSE_ID_ENV: &str = "GOOGLE_CSE_ID";

/// Loads and parses a configuration file from the given path
///
/// Missing sections fall back to their defaults. Google credentials that are
/// not in the file are taken from `GOOGLE_API_KEY` / `GOOGLE_CSE_ID`.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use community_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Default delay: {}s", config.crawler.default_delay);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;
    apply_env_credentials(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Parses and validates configuration text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Fills unset provider credentials from an environment lookup
pub fn apply_env_credentials<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |v: String| if v.trim().is_empty() { None } else { Some(v) };

    if config.search.google_api_key.is_none() {
        config.search.google_api_key = lookup(GOOGLE_API_KEY_ENV).and_then(non_blank);
    }
    if config.search.google_cse_id.is_none() {
        config.search.google_cse_id = lookup(GOOGLE_CSE_ID_ENV).and_then(non_blank);
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be correlated with the settings they used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
