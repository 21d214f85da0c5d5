//! Shared fixtures for the integration tests

use async_trait::async_trait;
use community_harvest::config::{Config, CrawlerConfig};
use community_harvest::crawler::{FetchResponse, HttpFetcher};
use community_harvest::NetworkError;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// In-memory fetcher serving scripted responses per URL
///
/// Responses for a URL are served in order; the last one repeats forever.
/// Unknown URLs answer 404.
#[derive(Default)]
pub struct StubFetcher {
    responses: Mutex<HashMap<String, VecDeque<FetchResponse>>>,
    requests: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, status: u16, body: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(FetchResponse {
                status,
                body: body.into(),
                final_url: url.to_string(),
            });
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl HttpFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, NetworkError> {
        self.requests.lock().unwrap().push(url.to_string());

        let mut responses = self.responses.lock().unwrap();
        let response = match responses.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        Ok(response.unwrap_or_else(|| FetchResponse {
            status: 404,
            body: String::new(),
            final_url: url.to_string(),
        }))
    }
}

/// Crawler settings without real-time waits
pub fn fast_crawler_config() -> CrawlerConfig {
    CrawlerConfig {
        default_delay: 0.0,
        jitter_min: 0.0,
        jitter_max: 0.0,
        backoff_base: 0.01,
        ..CrawlerConfig::default()
    }
}

/// Full configuration using only the direct-crawl adapter
pub fn direct_only_config() -> Config {
    let mut config = Config::default();
    config.crawler = fast_crawler_config();
    config.search.adapters = vec!["direct".to_string()];
    config
}

/// A ruliweb post page with the given comments as (author, text)
pub fn ruliweb_post(title: &str, body: &str, comments: &[(&str, &str)]) -> String {
    let comments: String = comments
        .iter()
        .map(|(author, text)| {
            format!(
                r#"<tr class="comment_element"><td><span class="nick">{author}</span><span class="text">{text}</span></td></tr>"#
            )
        })
        .collect();

    format!(
        r#"<html><body>
<div class="board_main">
  <div class="board_main_top">
    <h4 class="subject"><span class="subject_text">{title}</span></h4>
    <div class="user_view"><span class="nick">작성자</span><span class="regdate">2024.05.01 (10:00:00)</span></div>
  </div>
  <div class="board_main_view"><div class="view_content"><p>{body}</p></div></div>
</div>
<div class="comment_view"><table>{comments}</table></div>
</body></html>"#
    )
}

/// A ruliweb board listing linking to the given (post id, title) pairs
pub fn ruliweb_listing(posts: &[(u32, &str)]) -> String {
    let rows: String = posts
        .iter()
        .map(|(id, title)| {
            format!(
                r#"<tr class="table_body"><td class="subject"><a class="deco" href="/community/board/300143/read/{id}">{title}</a></td></tr>"#
            )
        })
        .collect();
    format!("<html><body><table><tbody>{rows}</tbody></table></body></html>")
}
