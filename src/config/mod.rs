//! Configuration module for Community-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use community_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawling {} sites", config.targets.sites.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, HttpConfig, SearchConfig, TargetsConfig, DEFAULT_USER_AGENTS,
};

// Re-export parser functions
pub use parser::{
    apply_env_credentials, compute_config_hash, load_config, load_config_with_hash, parse_config,
    GOOGLE_API_KEY_ENV, GOOGLE_CSE_ID_ENV,
};
