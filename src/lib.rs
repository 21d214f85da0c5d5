//! Community-Harvest: polite acquisition of community posts and comments
//!
//! This crate discovers candidate posts on community sites through a set of
//! interchangeable search backends, filters them for relevance, and fetches
//! each surviving post (with its paginated comment thread) under per-domain
//! rate limits, dispatching to site-specific or generic HTML extractors.

pub mod config;
pub mod crawler;
pub mod model;
pub mod parsers;
pub mod relevance;
pub mod search;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Community-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
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

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Clone, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Transport failures and non-2xx responses other than throttling
#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },
}

/// The target answered with a throttling status (HTTP 429 or equivalent)
#[derive(Debug, Clone, Error)]
#[error("Throttled by {url} (HTTP {status})")]
pub struct ThrottleError {
    pub url: String,
    pub status: u16,
}

/// Either kind of failure observed while fetching a page
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Throttled(#[from] ThrottleError),
}

/// A parser could not locate the structure it expects
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("{parser} parser could not find the {node}")]
    MissingNode {
        parser: &'static str,
        node: &'static str,
    },

    #[error("{parser} parser rejected the document: {message}")]
    Malformed {
        parser: &'static str,
        message: String,
    },
}

/// A single search adapter failed
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("{adapter} is not available")]
    Unavailable { adapter: String },

    #[error("{adapter} is throttled")]
    Throttled { adapter: String },

    #[error("{adapter} quota exhausted")]
    QuotaExhausted { adapter: String },

    #[error("{adapter} request failed: {source}")]
    Network {
        adapter: String,
        #[source]
        source: NetworkError,
    },

    #[error("{adapter} returned an unreadable response: {message}")]
    Parse { adapter: String, message: String },

    #[error("{adapter} returned no results")]
    Empty { adapter: String },

    #[error("{adapter} does not support site {site}")]
    UnsupportedSite { adapter: String, site: String },
}

/// One adapter's failure, recorded during failover
#[derive(Debug, Clone)]
pub struct AdapterFailure {
    pub adapter: String,
    pub error: ProviderError,
}

/// Errors surfaced by the search layer
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("No search adapters registered")]
    NoAdapters,

    #[error("All search adapters failed for {keywords:?} on {site}: {}", summarize_failures(.failures))]
    Exhausted {
        keywords: Vec<String>,
        site: String,
        failures: Vec<AdapterFailure>,
    },
}

fn summarize_failures(failures: &[AdapterFailure]) -> String {
    if failures.is_empty() {
        return "no adapter was available".to_string();
    }
    failures
        .iter()
        .map(|f| f.error.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Terminal failure to obtain one URL's content
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Domain {domain} abandoned after repeated throttling")]
    DomainAbandoned { domain: String },

    #[error("Giving up on {url} after {attempts} attempts: {source}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        source: FetchError,
    },

    #[error("{url} rejected with HTTP {status}")]
    Rejected { url: String, status: u16 },

    #[error("Could not parse {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: ParseError,
    },

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: UrlError,
    },
}

impl CrawlError {
    /// Returns true if the whole domain should be skipped for the rest of the run
    pub fn abandons_domain(&self) -> bool {
        matches!(self, Self::DomainAbandoned { .. })
    }
}

/// Result type alias for Community-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{ContentCrawler, CrawlOrchestrator, CrawlReport, RateLimiter};
pub use model::{Comment, PostContent, SearchResult};
pub use parsers::{ContentParser, ParserRegistry};
pub use search::{SearchAdapter, SearchCache, SearchEngineManager};
pub use url::{extract_domain, normalize_url};
