//! Candidate discovery through interchangeable search backends
//!
//! This module handles:
//! - The [`SearchAdapter`] capability and its three backends
//! - Caching filtered results per (keywords, site, limit)
//! - Failover across adapters with a sticky preference for the last one that worked
//!
//! # Adapters
//!
//! - `duckduckgo`: scrapes the DuckDuckGo HTML endpoint
//! - `google`: Google Custom Search JSON API, needs an API key and engine id
//! - `direct`: reads a board listing page on the target site itself

mod cache;
mod direct;
mod duckduckgo;
mod google;
mod manager;

pub use cache::{CacheKey, CacheStats, SearchCache};
pub use direct::{default_boards, DirectCrawlAdapter};
pub use duckduckgo::DuckDuckGoAdapter;
pub use google::GoogleCseAdapter;
pub use manager::{SearchEngineManager, SearchOutcome};

use crate::config::SearchConfig;
use crate::crawler::{HttpFetcher, RateLimiter};
use crate::model::SearchResult;
use crate::parsers::ParserRegistry;
use crate::ProviderError;
use async_trait::async_trait;
use std::sync::Arc;

/// Adapter names accepted in `[search] adapters`
pub const KNOWN_ADAPTERS: &[&str] = &["duckduckgo", "google", "direct"];

/// One search backend
#[async_trait]
pub trait SearchAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// False while unconfigured or cooling down after throttling
    fn is_available(&self) -> bool;

    /// Returns at most `max_results` unscored candidates on `site`
    async fn search(
        &self,
        keywords: &[String],
        site: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ProviderError>;

    /// Clears any throttle cooldown
    fn reset_throttle(&self) {}
}

/// Query string restricting `keywords` to `site`
pub fn build_query(keywords: &[String], site: &str) -> String {
    let terms: Vec<&str> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();
    format!("{} site:{}", terms.join(" "), site.trim())
}

/// Instantiates the configured adapters in failover order
///
/// Unknown names are skipped with a warning; configuration validation
/// rejects them before this point.
pub fn build_adapters(
    config: &SearchConfig,
    fetcher: Arc<dyn HttpFetcher>,
    registry: Arc<ParserRegistry>,
    limiter: Arc<RateLimiter>,
) -> Vec<Arc<dyn SearchAdapter>> {
    let mut adapters: Vec<Arc<dyn SearchAdapter>> = Vec::new();

    for name in &config.adapters {
        match name.as_str() {
            "duckduckgo" => {
                adapters.push(Arc::new(DuckDuckGoAdapter::new(Arc::clone(&fetcher))));
            }
            "google" => {
                adapters.push(Arc::new(GoogleCseAdapter::new(
                    Arc::clone(&fetcher),
                    config.google_api_key.clone(),
                    config.google_cse_id.clone(),
                )));
            }
            "direct" => {
                let mut boards = default_boards();
                boards.extend(
                    config
                        .boards
                        .iter()
                        .map(|(domain, url)| (domain.to_lowercase(), url.clone())),
                );
                adapters.push(Arc::new(DirectCrawlAdapter::new(
                    Arc::clone(&fetcher),
                    Arc::clone(&registry),
                    Arc::clone(&limiter),
                    boards,
                )));
            }
            other => {
                tracing::warn!("Ignoring unknown search adapter '{}'", other);
            }
        }
    }

    adapters
}
