use crate::crawler::HttpFetcher;
use crate::model::SearchResult;
use crate::parsers::extract::{inline_text, select_first};
use crate::search::{build_query, SearchAdapter};
use crate::url::{domain_of, matches_domain};
use crate::{NetworkError, ProviderError};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

const ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// How long the adapter sits out after being throttled
pub const THROTTLE_COOLDOWN: Duration = Duration::from_secs(300);

/// Marker DuckDuckGo serves instead of results when it suspects a bot
const ANOMALY_MARKER: &str = "anomaly-modal";

/// DuckDuckGo HTML search
///
/// A throttling signal (HTTP 429, HTTP 202 or the anomaly page) takes the
/// adapter out of rotation for [`THROTTLE_COOLDOWN`].
pub struct DuckDuckGoAdapter {
    fetcher: Arc<dyn HttpFetcher>,
    endpoint: String,
    throttled_until: Mutex<Option<Instant>>,
}

impl DuckDuckGoAdapter {
    pub fn new(fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self::with_endpoint(fetcher, ENDPOINT)
    }

    pub fn with_endpoint(fetcher: Arc<dyn HttpFetcher>, endpoint: impl Into<String>) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.into(),
            throttled_until: Mutex::new(None),
        }
    }

    fn mark_throttled(&self) {
        let mut until = self.throttled_until.lock().unwrap_or_else(|e| e.into_inner());
        *until = Some(Instant::now() + THROTTLE_COOLDOWN);
        tracing::warn!(adapter = "duckduckgo", "Throttled, disabled for {:?}", THROTTLE_COOLDOWN);
    }

    fn throttled(&self) -> ProviderError {
        self.mark_throttled();
        ProviderError::Throttled {
            adapter: self.name().to_string(),
        }
    }
}

#[async_trait]
impl SearchAdapter for DuckDuckGoAdapter {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    fn is_available(&self) -> bool {
        let until = self.throttled_until.lock().unwrap_or_else(|e| e.into_inner());
        until.map_or(true, |until| Instant::now() >= until)
    }

    async fn search(
        &self,
        keywords: &[String],
        site: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        let query = build_query(keywords, site);
        let url = Url::parse_with_params(&self.endpoint, &[("q", query.as_str())]).map_err(|e| {
            ProviderError::Parse {
                adapter: self.name().to_string(),
                message: format!("bad endpoint {}: {}", self.endpoint, e),
            }
        })?;

        tracing::debug!(adapter = "duckduckgo", "Searching: {}", query);

        let response = self
            .fetcher
            .fetch(url.as_str())
            .await
            .map_err(|source| ProviderError::Network {
                adapter: self.name().to_string(),
                source,
            })?;

        if response.status == 429 || response.status == 202 {
            return Err(self.throttled());
        }
        if !response.is_success() {
            return Err(ProviderError::Network {
                adapter: self.name().to_string(),
                source: NetworkError::Status {
                    url: url.to_string(),
                    status: response.status,
                },
            });
        }
        if response.body.contains(ANOMALY_MARKER) {
            return Err(self.throttled());
        }

        let results = parse_results(&response.body, site, max_results);
        tracing::debug!(adapter = "duckduckgo", "{} results for {}", results.len(), query);
        Ok(results)
    }

    fn reset_throttle(&self) {
        let mut until = self.throttled_until.lock().unwrap_or_else(|e| e.into_inner());
        *until = None;
    }
}

/// Extracts organic results on `site` from a DuckDuckGo HTML page
pub fn parse_results(html: &str, site: &str, max_results: usize) -> Vec<SearchResult> {
    let (Ok(result_sel), Ok(link_sel)) = (
        Selector::parse(".result:not(.result--ad)"),
        Selector::parse("a.result__a"),
    ) else {
        return Vec::new();
    };

    let Some(site) = domain_of(site) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut results = Vec::new();

    for item in document.select(&result_sel) {
        if results.len() >= max_results {
            break;
        }
        let Some(link) = item.select(&link_sel).next() else {
            continue;
        };
        let Some(target) = link.value().attr("href").and_then(decode_redirect) else {
            continue;
        };
        let on_site = domain_of(target.as_str()).is_some_and(|host| matches_domain(&site, &host));
        if !on_site {
            continue;
        }

        let snippet = select_first(item, &[".result__snippet"])
            .map(inline_text)
            .unwrap_or_default();
        results.push(SearchResult::new(target.as_str(), inline_text(link), snippet));
    }

    results
}

/// Resolves DuckDuckGo's `/l/?uddg=` redirect links to their target
fn decode_redirect(href: &str) -> Option<Url> {
    let base = Url::parse("https://duckduckgo.com/").ok()?;
    let url = base.join(href).ok()?;

    let is_redirect = url.host_str().is_some_and(|h| h.ends_with("duckduckgo.com"));
    let target = if is_redirect {
        let (_, target) = url.query_pairs().find(|(key, _)| key == "uddg")?;
        Url::parse(&target).ok()?
    } else {
        url
    };

    matches!(target.scheme(), "http" | "https").then_some(target)
}
