use crate::crawler::HttpFetcher;
use crate::model::SearchResult;
use crate::search::{build_query, SearchAdapter};
use crate::{NetworkError, ProviderError};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

const ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// The API returns at most ten items per request
const MAX_PAGE_SIZE: usize = 10;

#[derive(Debug, Default, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

/// Google Custom Search JSON API
///
/// Unavailable unless both an API key and a search engine id are set.
/// HTTP 403 is the API's daily-quota signal.
pub struct GoogleCseAdapter {
    fetcher: Arc<dyn HttpFetcher>,
    endpoint: String,
    api_key: Option<String>,
    cse_id: Option<String>,
}

impl GoogleCseAdapter {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, api_key: Option<String>, cse_id: Option<String>) -> Self {
        Self {
            fetcher,
            endpoint: ENDPOINT.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            cse_id: cse_id.filter(|id| !id.trim().is_empty()),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Rewrites a transport error so neither the request URL nor the key survive
    fn redact(&self, error: NetworkError, request_url: &str, key: &str) -> NetworkError {
        let scrub = |message: String| {
            message
                .replace(request_url, &self.endpoint)
                .replace(key, "<redacted>")
        };
        let url = self.endpoint.clone();
        match error {
            NetworkError::Timeout { .. } => NetworkError::Timeout { url },
            NetworkError::Connect { message, .. } => NetworkError::Connect {
                url,
                message: scrub(message),
            },
            NetworkError::Status { status, .. } => NetworkError::Status { url, status },
            NetworkError::Request { message, .. } => NetworkError::Request {
                url,
                message: scrub(message),
            },
        }
    }

    fn error(&self, message: impl Into<String>) -> ProviderError {
        ProviderError::Parse {
            adapter: self.name().to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl SearchAdapter for GoogleCseAdapter {
    fn name(&self) -> &str {
        "google"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some() && self.cse_id.is_some()
    }

    async fn search(
        &self,
        keywords: &[String],
        site: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        let (Some(key), Some(cx)) = (&self.api_key, &self.cse_id) else {
            return Err(ProviderError::Unavailable {
                adapter: self.name().to_string(),
            });
        };

        let query = build_query(keywords, site);
        let num = max_results.clamp(1, MAX_PAGE_SIZE).to_string();
        let url = Url::parse_with_params(
            &self.endpoint,
            &[
                ("key", key.as_str()),
                ("cx", cx.as_str()),
                ("q", query.as_str()),
                ("num", num.as_str()),
            ],
        )
        .map_err(|e| self.error(format!("bad endpoint {}: {}", self.endpoint, e)))?;

        tracing::debug!(adapter = "google", "Searching: {}", query);

        let response = self
            .fetcher
            .fetch(url.as_str())
            .await
            .map_err(|error| ProviderError::Network {
                adapter: self.name().to_string(),
                source: self.redact(error, url.as_str(), key),
            })?;

        match response.status {
            429 => {
                return Err(ProviderError::Throttled {
                    adapter: self.name().to_string(),
                })
            }
            403 => {
                return Err(ProviderError::QuotaExhausted {
                    adapter: self.name().to_string(),
                })
            }
            _ if !response.is_success() => {
                // The API key is in the query string; errors only name the endpoint
                return Err(ProviderError::Network {
                    adapter: self.name().to_string(),
                    source: NetworkError::Status {
                        url: self.endpoint.clone(),
                        status: response.status,
                    },
                });
            }
            _ => {}
        }

        let parsed: CseResponse =
            serde_json::from_str(&response.body).map_err(|e| self.error(e.to_string()))?;

        Ok(parsed
            .items
            .into_iter()
            .take(max_results)
            .map(|item| SearchResult::new(item.link, item.title, item.snippet))
            .collect())
    }
}
