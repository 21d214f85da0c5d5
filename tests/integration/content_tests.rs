//! Post and comment crawling over real HTTP against a mock server

use crate::common::fast_crawler_config;
use community_harvest::config::{CrawlerConfig, HttpConfig};
use community_harvest::crawler::{ContentCrawler, RateLimiter, ReqwestFetcher};
use community_harvest::parsers::{InvenParser, ParserRegistry};
use community_harvest::CrawlError;
use std::sync::Arc;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches requests without a query string
struct NoQuery;

impl Match for NoQuery {
    fn matches(&self, request: &Request) -> bool {
        request.url.query().is_none()
    }
}

fn crawler_with(config: &CrawlerConfig, registry: ParserRegistry) -> ContentCrawler {
    let fetcher = Arc::new(ReqwestFetcher::new(&HttpConfig::default()).unwrap());
    ContentCrawler::new(
        fetcher,
        Arc::new(RateLimiter::from_config(config)),
        Arc::new(registry),
        config,
    )
}

fn comment_page(page: u32, next: bool) -> String {
    let link = if next {
        format!(r#"<a class="next" href="/t/1?cpage={}">다음</a>"#, page + 1)
    } else {
        String::new()
    };
    format!(
        r#"<html><head><title>렉 걸림 현상</title></head><body>
<article><h1>렉 걸림 현상</h1><p>오늘 패치 이후로 마을에서 렉이 심하게 걸립니다. 다들 그런가요?</p></article>
<div id="comments">
<div class="comment"><span class="author">유저{page}</span><div class="text">저도 그래요 {page}-a</div></div>
<div class="comment"><span class="author">유저{page}</span><div class="text">재접속하면 나아짐 {page}-b</div></div>
</div>{link}</body></html>"#
    )
}

async fn mount_comment_pages(server: &MockServer, pages: u32) {
    Mock::given(method("GET"))
        .and(path("/t/1"))
        .and(NoQuery)
        .respond_with(ResponseTemplate::new(200).set_body_string(comment_page(1, pages > 1)))
        .mount(server)
        .await;

    for page in 2..=pages {
        Mock::given(method("GET"))
            .and(path("/t/1"))
            .and(query_param("cpage", page.to_string()))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(comment_page(page, page < pages)),
            )
            .mount(server)
            .await;
    }
}

fn cpage_hits(requests: &[Request], page: u32) -> usize {
    let wanted = format!("cpage={page}");
    requests
        .iter()
        .filter(|r| r.url.query() == Some(wanted.as_str()))
        .count()
}

#[tokio::test]
async fn test_comment_pages_stop_at_budget() {
    let mock_server = MockServer::start().await;
    mount_comment_pages(&mock_server, 5).await;

    let config = CrawlerConfig {
        max_comment_pages: 3,
        ..fast_crawler_config()
    };
    let crawler = crawler_with(&config, ParserRegistry::with_default_parsers());
    let url = format!("{}/t/1", mock_server.uri());

    let post = crawler.crawl_post(&url, "렉").await.expect("post should crawl");

    assert_eq!(post.title, "렉 걸림 현상");
    assert_eq!(post.keyword, "렉");
    assert_eq!(post.comment_count(), 6);
    assert_eq!(post.comments[0].content, "저도 그래요 1-a");
    assert_eq!(post.comments[5].content, "재접속하면 나아짐 3-b");

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(cpage_hits(&requests, 2), 1);
    assert_eq!(cpage_hits(&requests, 3), 1);
    assert_eq!(cpage_hits(&requests, 4), 0);
}

#[tokio::test]
async fn test_broken_site_parser_falls_back_to_generic() {
    let mock_server = MockServer::start().await;
    mount_comment_pages(&mock_server, 1).await;

    // Inven markup is absent from the page, so the site parser fails
    let registry = ParserRegistry::with_default_parsers();
    registry.register("127.0.0.1", Arc::new(InvenParser));

    let crawler = crawler_with(&fast_crawler_config(), registry);
    let url = format!("{}/t/1", mock_server.uri());

    let post = crawler.crawl_post(&url, "렉").await.expect("generic parser should succeed");

    assert!(post.body.contains("렉이 심하게"));
    assert_eq!(post.comment_count(), 2);
}

#[tokio::test]
async fn test_throttled_request_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/t/1"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_comment_pages(&mock_server, 1).await;

    let config = fast_crawler_config();
    let crawler = crawler_with(&config, ParserRegistry::with_default_parsers());
    let url = format!("{}/t/1", mock_server.uri());

    let post = crawler.crawl_post(&url, "렉").await.expect("retry should succeed");

    assert_eq!(post.comment_count(), 2);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
    // Success resets the backoff
    assert_eq!(crawler.limiter().backoff_level("127.0.0.1").await, 0);
}

#[tokio::test]
async fn test_missing_post_is_rejected_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let crawler = crawler_with(&fast_crawler_config(), ParserRegistry::with_default_parsers());
    let url = format!("{}/t/404", mock_server.uri());

    let err = crawler.crawl_post(&url, "렉").await.unwrap_err();

    assert!(matches!(err, CrawlError::Rejected { status: 404, .. }));
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_requests_carry_browser_identity() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header_exists("user-agent"))
        .and(header_exists("accept-language"))
        .respond_with(ResponseTemplate::new(200).set_body_string(comment_page(1, false)))
        .mount(&mock_server)
        .await;

    let crawler = crawler_with(&fast_crawler_config(), ParserRegistry::with_default_parsers());
    let url = format!("{}/t/1", mock_server.uri());

    let html = crawler.fetch_html(&url).await.expect("headers should match");
    assert!(html.contains("렉 걸림 현상"));
}
