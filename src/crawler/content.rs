//! Post and comment acquisition
//!
//! This module handles:
//! - Rate-limited fetching with the throttle/backoff and retry contract
//! - Parser selection, with generic fallback when a site parser fails
//! - Following comment pages up to a page budget

use crate::config::CrawlerConfig;
use crate::crawler::{FetchResponse, HttpFetcher, RateLimiter};
use crate::model::{Comment, PostContent};
use crate::parsers::{ContentParser, ParserRegistry};
use crate::url::domain_of;
use crate::{CrawlError, FetchError, NetworkError, ThrottleError, UrlError};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Fetches posts and their comment threads
///
/// Holds no per-request state of its own: pacing lives in the shared
/// [`RateLimiter`] and parser selection in the shared [`ParserRegistry`].
pub struct ContentCrawler {
    fetcher: Arc<dyn HttpFetcher>,
    limiter: Arc<RateLimiter>,
    registry: Arc<ParserRegistry>,
    max_retries: u32,
    max_comment_pages: u32,
}

impl ContentCrawler {
    pub fn new(
        fetcher: Arc<dyn HttpFetcher>,
        limiter: Arc<RateLimiter>,
        registry: Arc<ParserRegistry>,
        config: &CrawlerConfig,
    ) -> Self {
        Self {
            fetcher,
            limiter,
            registry,
            max_retries: config.max_retries,
            max_comment_pages: config.max_comment_pages,
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn registry(&self) -> &Arc<ParserRegistry> {
        &self.registry
    }

    pub fn max_comment_pages(&self) -> u32 {
        self.max_comment_pages
    }

    /// Fetches a page body, honoring the domain's pacing
    ///
    /// Throttling responses back the domain off and are retried until the
    /// limiter gives up on the domain. Server errors and transport failures
    /// are retried up to `max_retries` times. Other 4xx responses fail
    /// immediately.
    pub async fn fetch_html(&self, url: &str) -> Result<String, CrawlError> {
        self.fetch_page(url).await.map(|page| page.body)
    }

    /// Like [`fetch_html`](Self::fetch_html), keeping the URL the page was served from
    async fn fetch_page(&self, url: &str) -> Result<FetchResponse, CrawlError> {
        let domain = domain_of(url).ok_or_else(|| CrawlError::InvalidUrl {
            url: url.to_string(),
            source: UrlError::MissingDomain,
        })?;

        let mut throttles = 0u32;
        let mut failures = 0u32;

        loop {
            self.limiter.wait(&domain).await?;

            let error: FetchError = match self.fetcher.fetch(url).await {
                Ok(response) if response.is_throttled() => {
                    let throttle = ThrottleError {
                        url: url.to_string(),
                        status: response.status,
                    };
                    throttles += 1;
                    if !self.limiter.handle_rate_limit(&domain, throttles).await {
                        tracing::warn!(domain = %domain, "{}, abandoning domain", throttle);
                        return Err(CrawlError::DomainAbandoned { domain });
                    }
                    tracing::debug!("{}, retrying after backoff", throttle);
                    continue;
                }
                Ok(response) if response.is_success() => {
                    self.limiter.record_success(&domain).await;
                    return Ok(response);
                }
                Ok(response) if (400..500).contains(&response.status) => {
                    self.limiter.record_success(&domain).await;
                    return Err(CrawlError::Rejected {
                        url: url.to_string(),
                        status: response.status,
                    });
                }
                Ok(response) => NetworkError::Status {
                    url: url.to_string(),
                    status: response.status,
                }
                .into(),
                Err(error) => error.into(),
            };

            failures += 1;
            if failures > self.max_retries {
                return Err(CrawlError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: failures,
                    source: error,
                });
            }
            tracing::warn!(
                url = %url,
                "Fetch failed ({}), retry {}/{}",
                error,
                failures,
                self.max_retries
            );
            self.limiter.record_failure(&domain, failures).await;
        }
    }

    /// Fetches and parses one post, including its comment pages
    ///
    /// A site parser that cannot make sense of the page is replaced by the
    /// generic parser for this post; only a failure of the generic parser
    /// itself is surfaced.
    pub async fn crawl_post(&self, url: &str, keyword: &str) -> Result<PostContent, CrawlError> {
        let post_url = parse_url(url)?;
        let page = self.fetch_page(url).await?;
        let page_url = landing_url(&page.final_url, &post_url);
        let html = page.body;

        let parser = self.registry.get_parser(url);
        let (mut post, parser) = match parser.parse_post(&html, &post_url, keyword) {
            Ok(post) => (post, parser),
            Err(error) if !self.registry.is_generic(&parser) => {
                tracing::warn!(
                    url = %url,
                    "{} parser failed ({}), falling back to generic",
                    parser.name(),
                    error
                );
                let generic = self.registry.generic();
                let post = generic
                    .parse_post(&html, &post_url, keyword)
                    .map_err(|source| CrawlError::Parse {
                        url: url.to_string(),
                        source,
                    })?;
                (post, generic)
            }
            Err(source) => {
                return Err(CrawlError::Parse {
                    url: url.to_string(),
                    source,
                })
            }
        };

        let first_page = std::mem::take(&mut post.comments);
        post.comments = self
            .follow_comment_pages(&parser, &page_url, html, first_page, self.max_comment_pages)
            .await;

        tracing::info!(
            url = %url,
            site = %post.site,
            "Crawled post with {} comments",
            post.comment_count()
        );
        Ok(post)
    }

    /// Collects comments from up to `max_pages` pages of a post, in page order
    ///
    /// A post without a comment section yields no comments. Pagination
    /// stops early when no next page is found, a page adds nothing new,
    /// or a later page cannot be fetched.
    pub async fn crawl_comments(&self, url: &str, max_pages: u32) -> Result<Vec<Comment>, CrawlError> {
        let post_url = parse_url(url)?;
        if max_pages == 0 {
            return Ok(Vec::new());
        }

        let page = self.fetch_page(url).await?;
        let page_url = landing_url(&page.final_url, &post_url);
        let parser = self.registry.get_parser(url);
        let first_page = parser.parse_comments(&page.body);

        Ok(self
            .follow_comment_pages(&parser, &page_url, page.body, first_page, max_pages)
            .await)
    }

    /// Crawls posts one after another, skipping failures
    pub async fn crawl_posts<S: AsRef<str>>(&self, urls: &[S], keyword: &str) -> Vec<PostContent> {
        let mut posts = Vec::new();
        for (i, url) in urls.iter().enumerate() {
            let url = url.as_ref();
            tracing::debug!("Crawling {}/{}: {}", i + 1, urls.len(), url);
            match self.crawl_post(url, keyword).await {
                Ok(post) => posts.push(post),
                Err(e) => tracing::warn!(url = %url, "Skipping: {}", e),
            }
        }
        posts
    }

    async fn follow_comment_pages(
        &self,
        parser: &Arc<dyn ContentParser>,
        post_url: &Url,
        first_html: String,
        first_page: Vec<Comment>,
        max_pages: u32,
    ) -> Vec<Comment> {
        let mut seen: HashSet<(String, String)> = first_page.iter().map(identity).collect();
        let mut comments = first_page;
        let mut html = first_html;
        let mut page = 1;

        while page < max_pages {
            let Some(next) = parser.next_comment_page(&html, post_url, page) else {
                break;
            };

            html = match self.fetch_html(next.as_str()).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(url = %next, "Stopping comment pagination: {}", e);
                    break;
                }
            };
            page += 1;

            let fresh: Vec<Comment> = parser
                .parse_comments(&html)
                .into_iter()
                .filter(|comment| !seen.contains(&identity(comment)))
                .collect();
            if fresh.is_empty() {
                tracing::debug!(url = %next, "Comment page {} adds nothing new", page);
                break;
            }

            seen.extend(fresh.iter().map(identity));
            comments.extend(fresh);
        }

        comments
    }
}

impl std::fmt::Debug for ContentCrawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCrawler")
            .field("max_retries", &self.max_retries)
            .field("max_comment_pages", &self.max_comment_pages)
            .field("registry", &self.registry)
            .finish()
    }
}

fn identity(comment: &Comment) -> (String, String) {
    (comment.author.clone(), comment.content.clone())
}

/// Where a post ended up after redirects; comment links are relative to it
fn landing_url(final_url: &str, requested: &Url) -> Url {
    Url::parse(final_url).unwrap_or_else(|_| requested.clone())
}

fn parse_url(url: &str) -> Result<Url, CrawlError> {
    Url::parse(url).map_err(|e| CrawlError::InvalidUrl {
        url: url.to_string(),
        source: UrlError::Parse(e.to_string()),
    })
}
