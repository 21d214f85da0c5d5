use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Browser identities rotated by the content crawler
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

/// Main configuration structure for Community-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
    pub search: SearchConfig,
    pub targets: TargetsConfig,
}

/// Pacing, retry and filtering behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Minimum seconds between requests to the same domain
    #[serde(rename = "default-delay")]
    pub default_delay: f64,

    /// Throttle or transient-failure retries before giving up
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Minimum relevance score a search result needs to be crawled
    #[serde(rename = "relevance-threshold")]
    pub relevance_threshold: f64,

    /// Upper bound on comment pages fetched per post
    #[serde(rename = "max-comment-pages")]
    pub max_comment_pages: u32,

    /// Seconds a cached search result stays valid
    #[serde(rename = "cache-ttl")]
    pub cache_ttl: u64,

    #[serde(rename = "jitter-min")]
    pub jitter_min: f64,

    #[serde(rename = "jitter-max")]
    pub jitter_max: f64,

    /// Seconds multiplied by 2^level while a domain is backing off
    #[serde(rename = "backoff-base")]
    pub backoff_base: f64,

    /// Per-domain overrides of `default-delay`
    #[serde(rename = "domain-delays")]
    pub domain_delays: BTreeMap<String, f64>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            default_delay: 3.0,
            max_retries: 3,
            relevance_threshold: 0.5,
            max_comment_pages: 3,
            cache_ttl: 3600,
            jitter_min: 0.5,
            jitter_max: 2.0,
            backoff_base: 1.0,
            domain_delays: BTreeMap::new(),
        }
    }
}

impl CrawlerConfig {
    pub fn default_delay(&self) -> Duration {
        Duration::from_secs_f64(self.default_delay)
    }

    pub fn jitter_range(&self) -> (Duration, Duration) {
        (
            Duration::from_secs_f64(self.jitter_min),
            Duration::from_secs_f64(self.jitter_max),
        )
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_secs_f64(self.backoff_base)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Seconds allowed to establish a connection
    #[serde(rename = "connect-timeout")]
    pub connect_timeout: u64,

    /// Seconds allowed for the whole response
    #[serde(rename = "read-timeout")]
    pub read_timeout: u64,

    #[serde(rename = "user-agents")]
    pub user_agents: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: 10,
            read_timeout: 30,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout)
    }
}

/// Search backends and their credentials
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Adapter names in failover order
    pub adapters: Vec<String>,

    #[serde(rename = "max-results-per-site")]
    pub max_results_per_site: usize,

    #[serde(rename = "google-api-key")]
    pub google_api_key: Option<String>,

    #[serde(rename = "google-cse-id")]
    pub google_cse_id: Option<String>,

    /// Listing page per domain for the direct-crawl adapter
    pub boards: BTreeMap<String, String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            adapters: vec![
                "duckduckgo".to_string(),
                "google".to_string(),
                "direct".to_string(),
            ],
            max_results_per_site: 10,
            google_api_key: None,
            google_cse_id: None,
            boards: BTreeMap::new(),
        }
    }
}

/// What to look for and where
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TargetsConfig {
    pub keywords: Vec<String>,
    pub sites: Vec<String>,
}
