//! HTTP fetch capability
//!
//! This module handles all HTTP requests made by the pipeline:
//! - Building the HTTP client with connect/read timeouts and browser headers
//! - Rotating browser User-Agent strings per request
//! - Classifying transport failures into [`NetworkError`]
//!
//! Status codes are returned as-is; deciding what a 429 or a 5xx means is
//! left to the caller.

use crate::config::HttpConfig;
use crate::NetworkError;
use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{redirect::Policy, Client};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_KOREAN: &str = "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7";

/// A completed HTTP exchange, whatever its status
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
    /// URL after redirects
    pub final_url: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// HTTP 429 Too Many Requests
    pub fn is_throttled(&self) -> bool {
        self.status == 429
    }
}

/// Anything that can GET a URL
///
/// Implemented by [`ReqwestFetcher`] for real traffic; tests substitute
/// in-memory fetchers.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Performs a GET; `Err` only for transport failures (timeouts, refused connections)
    async fn fetch(&self, url: &str) -> Result<FetchResponse, NetworkError>;
}

/// Builds an HTTP client with proper configuration
///
/// The client sends browser-like Accept headers, follows up to ten
/// redirects and decompresses gzip/brotli bodies. The User-Agent is set per
/// request by [`ReqwestFetcher`].
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_KOREAN));

    Client::builder()
        .default_headers(headers)
        .timeout(config.read_timeout())
        .connect_timeout(config.connect_timeout())
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`HttpFetcher`] backed by reqwest, rotating browser identities
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    user_agents: Vec<String>,
}

impl ReqwestFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            user_agents: config.user_agents.clone(),
        })
    }

    /// Picks a User-Agent uniformly from the configured list
    pub fn random_user_agent(&self) -> Option<&str> {
        if self.user_agents.is_empty() {
            return None;
        }
        let index = rand::rng().random_range(0..self.user_agents.len());
        Some(self.user_agents[index].as_str())
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, NetworkError> {
        let mut request = self.client.get(url);
        if let Some(agent) = self.random_user_agent() {
            request = request.header(USER_AGENT, agent);
        }

        let response = request.send().await.map_err(|e| classify_error(url, e))?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| classify_error(url, e))?;

        Ok(FetchResponse {
            status,
            body,
            final_url,
        })
    }
}

/// The URL goes into its own field only; messages never repeat it
fn classify_error(url: &str, error: reqwest::Error) -> NetworkError {
    let error = error.without_url();
    if error.is_timeout() {
        NetworkError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        NetworkError::Connect {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        NetworkError::Request {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
