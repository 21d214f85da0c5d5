use crate::crawler::{HttpFetcher, RateLimiter};
use crate::model::SearchResult;
use crate::parsers::ParserRegistry;
use crate::search::SearchAdapter;
use crate::url::{best_match, domain_of};
use crate::{NetworkError, ProviderError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use url::Url;

/// Built-in listing pages for the supported community sites
pub fn default_boards() -> BTreeMap<String, String> {
    [
        ("inven.co.kr", "https://www.inven.co.kr/board/webzine/2097"),
        ("ruliweb.com", "https://bbs.ruliweb.com/community/board/300143"),
        (
            "dcinside.com",
            "https://gall.dcinside.com/mgallery/board/lists/?id=aoegame",
        ),
    ]
    .into_iter()
    .map(|(domain, url)| (domain.to_string(), url.to_string()))
    .collect()
}

/// Reads a site's board listing directly instead of a search index
///
/// Only posts whose title contains one of the keywords (case-insensitive)
/// are returned. The listing request goes through the shared rate limiter,
/// so it is paced like any other request to the site.
pub struct DirectCrawlAdapter {
    fetcher: Arc<dyn HttpFetcher>,
    registry: Arc<ParserRegistry>,
    limiter: Arc<RateLimiter>,
    boards: BTreeMap<String, String>,
}

impl DirectCrawlAdapter {
    pub fn new(
        fetcher: Arc<dyn HttpFetcher>,
        registry: Arc<ParserRegistry>,
        limiter: Arc<RateLimiter>,
        boards: BTreeMap<String, String>,
    ) -> Self {
        Self {
            fetcher,
            registry,
            limiter,
            boards,
        }
    }

    /// Listing page used for `site`, matching subdomains too
    pub fn board_for(&self, site: &str) -> Option<&str> {
        let host = domain_of(site)?;
        let domain = best_match(&host, self.boards.keys().map(String::as_str))?;
        self.boards.get(domain).map(String::as_str)
    }

    fn throttled(&self) -> ProviderError {
        ProviderError::Throttled {
            adapter: self.name().to_string(),
        }
    }
}

#[async_trait]
impl SearchAdapter for DirectCrawlAdapter {
    fn name(&self) -> &str {
        "direct"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn search(
        &self,
        keywords: &[String],
        site: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        let Some(board) = self.board_for(site).map(str::to_string) else {
            return Err(ProviderError::UnsupportedSite {
                adapter: self.name().to_string(),
                site: site.to_string(),
            });
        };
        let base = Url::parse(&board).map_err(|e| ProviderError::Parse {
            adapter: self.name().to_string(),
            message: format!("bad board URL {}: {}", board, e),
        })?;

        if let Err(e) = self.limiter.wait(&board).await {
            tracing::warn!(adapter = "direct", "Skipping board {}: {}", board, e);
            return Err(self.throttled());
        }

        tracing::info!(adapter = "direct", "Reading board listing {}", board);

        let response = self
            .fetcher
            .fetch(&board)
            .await
            .map_err(|source| ProviderError::Network {
                adapter: self.name().to_string(),
                source,
            })?;

        if response.is_throttled() {
            self.limiter.handle_rate_limit(&board, 1).await;
            return Err(self.throttled());
        }
        if !response.is_success() {
            return Err(ProviderError::Network {
                adapter: self.name().to_string(),
                source: NetworkError::Status {
                    url: board,
                    status: response.status,
                },
            });
        }
        self.limiter.record_success(&board).await;

        let wanted: Vec<String> = keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        let parser = self.registry.get_parser(&board);
        let results: Vec<SearchResult> = parser
            .parse_listing(&response.body, &base)
            .into_iter()
            .filter(|entry| {
                let title = entry.title.to_lowercase();
                wanted.iter().any(|k| title.contains(k.as_str()))
            })
            .take(max_results)
            .map(|entry| SearchResult::new(entry.url, entry.title, ""))
            .collect();

        tracing::debug!(adapter = "direct", "{} matching posts on {}", results.len(), board);
        Ok(results)
    }
}
