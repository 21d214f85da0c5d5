//! Acquisition: fetching, pacing and run orchestration
//!
//! This module contains the network-facing half of the pipeline:
//! - HTTP fetching behind the [`HttpFetcher`] capability
//! - Per-domain pacing, jitter and throttle backoff ([`RateLimiter`])
//! - Post and comment crawling with parser fallback ([`ContentCrawler`])
//! - The end-to-end run ([`CrawlOrchestrator`])

mod content;
mod fetcher;
mod orchestrator;
mod rate_limiter;

pub use content::ContentCrawler;
pub use fetcher::{build_http_client, FetchResponse, HttpFetcher, ReqwestFetcher};
pub use orchestrator::{CrawlEvent, CrawlOrchestrator, CrawlReport, CrawlTarget, PostSink};
pub use rate_limiter::RateLimiter;

use crate::config::Config;
use crate::model::PostContent;
use crate::HarvestError;

/// Runs a complete search-and-crawl over the configured targets
///
/// Builds the pipeline from `config`, crawls `[targets]` and returns the
/// posts. Individual failures are logged and skipped.
pub async fn crawl(config: &Config) -> Result<Vec<PostContent>, HarvestError> {
    let orchestrator = CrawlOrchestrator::from_config(config)?;
    Ok(orchestrator
        .crawl(&config.targets.keywords, &config.targets.sites)
        .await)
}
