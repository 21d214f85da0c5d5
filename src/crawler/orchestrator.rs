//! Run orchestration: discovery, relevance gate, acquisition
//!
//! This module ties the pipeline together:
//! - Searching every target site for the run's keywords
//! - Deduplicating candidates across sites
//! - Crawling candidates with one worker per domain
//! - Reporting failures as structured events instead of aborting the run

use crate::config::Config;
use crate::crawler::{ContentCrawler, HttpFetcher, RateLimiter, ReqwestFetcher};
use crate::model::{PostContent, SearchResult};
use crate::parsers::ParserRegistry;
use crate::search::{build_adapters, SearchEngineManager};
use crate::url::{dedup_key, domain_of};
use crate::{HarvestError, SearchError};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// A recoverable failure worth surfacing to whoever runs the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    /// A domain kept throttling and was skipped for the rest of the run
    DomainAbandoned { domain: String, skipped_urls: usize },
    /// One URL could not be fetched or parsed
    UrlSkipped { url: String, reason: String },
    /// No adapter produced results for a site
    SearchExhausted {
        keywords: Vec<String>,
        site: String,
        reason: String,
    },
}

impl CrawlEvent {
    fn emit(&self) {
        match self {
            Self::DomainAbandoned { domain, .. } => {
                tracing::warn!(domain = %domain, "{}", self)
            }
            Self::UrlSkipped { url, .. } => tracing::warn!(url = %url, "{}", self),
            Self::SearchExhausted { site, .. } => tracing::error!(site = %site, "{}", self),
        }
    }
}

impl fmt::Display for CrawlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DomainAbandoned {
                domain,
                skipped_urls,
            } => write!(
                f,
                "domain {} abandoned, {} queued URLs skipped",
                domain, skipped_urls
            ),
            Self::UrlSkipped { url, reason } => write!(f, "skipped {}: {}", url, reason),
            Self::SearchExhausted {
                keywords,
                site,
                reason,
            } => write!(f, "no results for {:?} on {}: {}", keywords, site, reason),
        }
    }
}

/// Receives each post as soon as it is crawled
///
/// This is where persistence plugs in; the orchestrator itself keeps posts
/// only in memory.
pub trait PostSink: Send + Sync {
    fn accept(&self, post: &PostContent);
}

/// A discovered URL queued for acquisition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlTarget {
    pub url: String,
    pub site: String,
    /// Keyword credited with the discovery
    pub keyword: String,
    pub relevance_score: f64,
}

/// Summary of one run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub posts: Vec<PostContent>,
    pub keywords: Vec<String>,
    pub sites: Vec<String>,
    /// Unique candidate URLs that passed the relevance gate
    pub total_searched: usize,
    pub total_crawled: usize,
    pub total_failed: usize,
    pub events: Vec<CrawlEvent>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Share of attempted URLs that produced a post, in [0, 1]
    pub fn success_rate(&self) -> f64 {
        let attempted = self.total_crawled + self.total_failed;
        if attempted == 0 {
            0.0
        } else {
            self.total_crawled as f64 / attempted as f64
        }
    }
}

#[derive(Debug, Default)]
struct WorkerOutcome {
    posts: Vec<PostContent>,
    failed: usize,
    events: Vec<CrawlEvent>,
}

/// Drives a whole run
pub struct CrawlOrchestrator {
    manager: SearchEngineManager,
    crawler: ContentCrawler,
    max_results_per_site: usize,
    sink: Option<Arc<dyn PostSink>>,
}

impl CrawlOrchestrator {
    pub fn new(manager: SearchEngineManager, crawler: ContentCrawler, max_results_per_site: usize) -> Self {
        Self {
            manager,
            crawler,
            max_results_per_site,
            sink: None,
        }
    }

    /// Builds the full pipeline over real HTTP
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOrchestrator)` - Ready to run
    /// * `Err(HarvestError)` - The HTTP client could not be built
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let fetcher = ReqwestFetcher::new(&config.http)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// Builds the pipeline around an arbitrary fetch capability
    pub fn with_fetcher(config: &Config, fetcher: Arc<dyn HttpFetcher>) -> Self {
        let limiter = Arc::new(RateLimiter::from_config(&config.crawler));
        let registry = Arc::new(ParserRegistry::with_default_parsers());

        let adapters = build_adapters(
            &config.search,
            Arc::clone(&fetcher),
            Arc::clone(&registry),
            Arc::clone(&limiter),
        );
        let manager = SearchEngineManager::new(
            adapters,
            config.crawler.cache_ttl(),
            config.crawler.relevance_threshold,
        );
        let crawler = ContentCrawler::new(fetcher, limiter, registry, &config.crawler);

        Self::new(manager, crawler, config.search.max_results_per_site)
    }

    pub fn with_sink(mut self, sink: Arc<dyn PostSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn manager(&self) -> &SearchEngineManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut SearchEngineManager {
        &mut self.manager
    }

    pub fn crawler(&self) -> &ContentCrawler {
        &self.crawler
    }

    /// Searches and crawls, returning only the posts
    pub async fn crawl(&self, keywords: &[String], sites: &[String]) -> Vec<PostContent> {
        self.run(keywords, sites).await.posts
    }

    /// Searches every site, then crawls every relevant candidate
    ///
    /// Failures never abort the run: an exhausted search skips that site,
    /// a failed URL is skipped, and a domain that keeps throttling is
    /// abandoned for the rest of the run. Each of these is recorded as a
    /// [`CrawlEvent`].
    pub async fn run(&self, keywords: &[String], sites: &[String]) -> CrawlReport {
        let started_at = Utc::now();
        tracing::info!("Starting run: keywords={:?}, sites={:?}", keywords, sites);

        let (targets, mut events) = self.search_only(keywords, sites).await;
        let total_searched = targets.len();
        tracing::info!("{} candidate URLs passed the relevance gate", total_searched);

        let outcome = self.crawl_targets(targets).await;
        events.extend(outcome.events);

        let report = CrawlReport {
            total_crawled: outcome.posts.len(),
            total_failed: outcome.failed,
            posts: outcome.posts,
            keywords: keywords.to_vec(),
            sites: sites.to_vec(),
            total_searched,
            events,
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            "Run complete: {} crawled, {} failed ({:.1}% success) in {}s",
            report.total_crawled,
            report.total_failed,
            report.success_rate() * 100.0,
            report.duration().num_seconds()
        );
        report
    }

    /// Discovery only: relevant candidates for every site, deduplicated
    pub async fn search_only(
        &self,
        keywords: &[String],
        sites: &[String],
    ) -> (Vec<CrawlTarget>, Vec<CrawlEvent>) {
        let mut targets = Vec::new();
        let mut events = Vec::new();
        let mut seen = HashSet::new();

        for site in sites {
            match self
                .manager
                .search(keywords, site, self.max_results_per_site)
                .await
            {
                Ok(outcome) => {
                    for result in outcome.results.iter() {
                        if seen.insert(dedup_key(&result.url)) {
                            targets.push(CrawlTarget {
                                url: result.url.clone(),
                                site: site.clone(),
                                keyword: credited_keyword(result, keywords),
                                relevance_score: result.relevance_score,
                            });
                        }
                    }
                }
                Err(error) => {
                    let event = CrawlEvent::SearchExhausted {
                        keywords: keywords.to_vec(),
                        site: site.clone(),
                        reason: search_failure_reason(&error),
                    };
                    event.emit();
                    events.push(event);
                }
            }
        }

        (targets, events)
    }

    /// Crawls known URLs directly, skipping discovery
    pub async fn crawl_urls(&self, urls: &[String], keyword: &str) -> CrawlReport {
        let started_at = Utc::now();
        let mut seen = HashSet::new();
        let targets: Vec<CrawlTarget> = urls
            .iter()
            .filter(|url| seen.insert(dedup_key(url)))
            .map(|url| CrawlTarget {
                url: url.clone(),
                site: domain_of(url).unwrap_or_default(),
                keyword: keyword.to_string(),
                relevance_score: 1.0,
            })
            .collect();
        let total_searched = targets.len();

        let outcome = self.crawl_targets(targets).await;

        CrawlReport {
            total_crawled: outcome.posts.len(),
            total_failed: outcome.failed,
            posts: outcome.posts,
            keywords: if keyword.is_empty() {
                Vec::new()
            } else {
                vec![keyword.to_string()]
            },
            sites: Vec::new(),
            total_searched,
            events: outcome.events,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// One sequential worker per domain, all domains concurrently
    async fn crawl_targets(&self, targets: Vec<CrawlTarget>) -> WorkerOutcome {
        let mut queues: Vec<(String, Vec<CrawlTarget>)> = Vec::new();
        for target in targets {
            let domain = domain_of(&target.url).unwrap_or_default();
            match queues.iter_mut().find(|(d, _)| *d == domain) {
                Some((_, queue)) => queue.push(target),
                None => queues.push((domain, vec![target])),
            }
        }

        let outcomes = join_all(
            queues
                .into_iter()
                .map(|(domain, queue)| self.crawl_domain(domain, queue)),
        )
        .await;

        let mut merged = WorkerOutcome::default();
        for outcome in outcomes {
            merged.posts.extend(outcome.posts);
            merged.failed += outcome.failed;
            merged.events.extend(outcome.events);
        }
        merged
    }

    async fn crawl_domain(&self, domain: String, queue: Vec<CrawlTarget>) -> WorkerOutcome {
        let mut outcome = WorkerOutcome::default();
        let total = queue.len();

        for (index, target) in queue.into_iter().enumerate() {
            match self.crawler.crawl_post(&target.url, &target.keyword).await {
                Ok(post) => {
                    if let Some(sink) = &self.sink {
                        sink.accept(&post);
                    }
                    outcome.posts.push(post);
                }
                Err(error) if error.abandons_domain() => {
                    let remaining = total - index;
                    outcome.failed += remaining;
                    let event = CrawlEvent::DomainAbandoned {
                        domain: domain.clone(),
                        skipped_urls: remaining,
                    };
                    event.emit();
                    outcome.events.push(event);
                    break;
                }
                Err(error) => {
                    outcome.failed += 1;
                    let event = CrawlEvent::UrlSkipped {
                        url: target.url,
                        reason: error.to_string(),
                    };
                    event.emit();
                    outcome.events.push(event);
                }
            }
        }

        outcome
    }
}

impl fmt::Debug for CrawlOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlOrchestrator")
            .field("manager", &self.manager)
            .field("crawler", &self.crawler)
            .field("max_results_per_site", &self.max_results_per_site)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

/// First keyword appearing in the result's title or snippet, else the first keyword
fn credited_keyword(result: &SearchResult, keywords: &[String]) -> String {
    let text = format!("{} {}", result.title, result.snippet).to_lowercase();
    keywords
        .iter()
        .find(|k| !k.trim().is_empty() && text.contains(&k.trim().to_lowercase()))
        .or_else(|| keywords.first())
        .cloned()
        .unwrap_or_default()
}

fn search_failure_reason(error: &SearchError) -> String {
    match error {
        SearchError::NoAdapters => error.to_string(),
        SearchError::Exhausted { failures, .. } => failures
            .iter()
            .map(|f| format!("{}: {}", f.adapter, f.error))
            .collect::<Vec<_>>()
            .join("; "),
    }
}
