//! Search layer: failover, caching, relevance gate and real HTTP adapters

use crate::common::StubFetcher;
use async_trait::async_trait;
use community_harvest::config::HttpConfig;
use community_harvest::crawler::ReqwestFetcher;
use community_harvest::relevance::filter;
use community_harvest::search::{
    DuckDuckGoAdapter, GoogleCseAdapter, SearchAdapter, SearchEngineManager,
};
use community_harvest::{ProviderError, SearchResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Adapter that always fails with the given error
struct Broken {
    name: &'static str,
    calls: AtomicUsize,
}

#[async_trait]
impl SearchAdapter for Broken {
    fn name(&self) -> &str {
        self.name
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn search(&self, _: &[String], _: &str, _: usize) -> Result<Vec<SearchResult>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::QuotaExhausted {
            adapter: self.name.to_string(),
        })
    }
}

/// Adapter returning a fixed batch of relevant results
struct Fixed {
    count: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl SearchAdapter for Fixed {
    fn name(&self) -> &str {
        "fixed"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn search(
        &self,
        _: &[String],
        site: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((0..self.count.min(max_results))
            .map(|i| {
                SearchResult::new(
                    format!("https://{site}/read/{i}"),
                    format!("업데이트 이후 튕김 문제 {i}"),
                    "업데이트 하고 나서 계속 튕깁니다",
                )
            })
            .collect())
    }
}

fn broken(name: &'static str) -> Arc<Broken> {
    Arc::new(Broken {
        name,
        calls: AtomicUsize::new(0),
    })
}

fn fixed(count: usize) -> Arc<Fixed> {
    Arc::new(Fixed {
        count,
        calls: AtomicUsize::new(0),
    })
}

const KEYWORDS: &[&str] = &["업데이트", "튕김"];

#[tokio::test]
async fn test_third_adapter_answers_after_two_failures() {
    let first = broken("first");
    let second = broken("second");
    let third = fixed(5);
    let adapters: Vec<Arc<dyn SearchAdapter>> = vec![first.clone(), second.clone(), third.clone()];
    let manager = SearchEngineManager::new(adapters, Duration::from_secs(3600), 0.5);

    let outcome = manager
        .search(KEYWORDS, "gall.dcinside.com", 10)
        .await
        .expect("third adapter should answer");

    assert_eq!(outcome.adapter.as_deref(), Some("fixed"));
    assert_eq!(outcome.attempted, vec!["first", "second", "fixed"]);
    assert_eq!(outcome.results.len(), 5);
    assert_eq!(first.calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.calls.load(Ordering::SeqCst), 1);

    let failed: Vec<&str> = outcome.failures.iter().map(|f| f.adapter.as_str()).collect();
    assert_eq!(failed, vec!["first", "second"]);
}

#[tokio::test]
async fn test_identical_query_within_ttl_is_served_from_cache() {
    let adapter = fixed(3);
    let manager = SearchEngineManager::new(vec![adapter.clone()], Duration::from_secs(3600), 0.5);

    let first = manager.search(KEYWORDS, "inven.co.kr", 10).await.unwrap();
    let second = manager.search(KEYWORDS, "inven.co.kr", 10).await.unwrap();

    assert!(Arc::ptr_eq(&first.results, &second.results));
    assert!(second.from_cache);
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);

    let stats = manager.cache_stats();
    assert_eq!((stats.total, stats.valid), (1, 1));
}

#[tokio::test]
async fn test_expired_cache_invokes_adapter_again() {
    let adapter = fixed(3);
    let manager = SearchEngineManager::new(vec![adapter.clone()], Duration::ZERO, 0.5);

    manager.search(KEYWORDS, "inven.co.kr", 10).await.unwrap();
    let again = manager.search(KEYWORDS, "inven.co.kr", 10).await.unwrap();

    assert!(!again.from_cache);
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_threshold_filter_keeps_order() {
    let results: Vec<SearchResult> = [0.9, 0.4, 0.6, 0.5]
        .iter()
        .enumerate()
        .map(|(i, score)| SearchResult::new(format!("https://x.com/{i}"), "", "").with_score(*score))
        .collect();

    let kept: Vec<f64> = filter(results, 0.5)
        .iter()
        .map(|r| r.relevance_score)
        .collect();

    assert_eq!(kept, vec![0.9, 0.6, 0.5]);
}

#[tokio::test]
async fn test_duckduckgo_over_http() {
    // Start a mock server standing in for html.duckduckgo.com
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/html/"))
        .and(query_param("q", "튕김 site:dcinside.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
<div class="result"><a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fgall.dcinside.com%2Fboard%2Fview%2F%3Fid%3Daoegame%26no%3D7">튕김 현상</a>
<a class="result__snippet">접속하면 튕김</a></div>
</body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let fetcher = Arc::new(ReqwestFetcher::new(&HttpConfig::default()).unwrap());
    let adapter = DuckDuckGoAdapter::with_endpoint(fetcher, format!("{}/html/", mock_server.uri()));

    let results = adapter
        .search(&["튕김".to_string()], "dcinside.com", 10)
        .await
        .expect("search should succeed");

    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].url,
        "https://gall.dcinside.com/board/view/?id=aoegame&no=7"
    );
    assert_eq!(results[0].snippet, "접속하면 튕김");
}

#[tokio::test]
async fn test_duckduckgo_throttle_takes_adapter_out_of_rotation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&mock_server)
        .await;

    let fetcher = Arc::new(ReqwestFetcher::new(&HttpConfig::default()).unwrap());
    let adapter = DuckDuckGoAdapter::with_endpoint(fetcher, format!("{}/html/", mock_server.uri()));

    let err = adapter
        .search(&["렉".to_string()], "inven.co.kr", 10)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Throttled { .. }));
    assert!(!adapter.is_available());

    adapter.reset_throttle();
    assert!(adapter.is_available());
}

#[tokio::test]
async fn test_google_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("key", "test-key"))
        .and(query_param("cx", "engine"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"items":[{"link":"https://www.inven.co.kr/board/lostark/1","title":"서버 렉","snippet":"렉 심함"}]}"#,
        ))
        .mount(&mock_server)
        .await;

    let fetcher = Arc::new(ReqwestFetcher::new(&HttpConfig::default()).unwrap());
    let adapter = GoogleCseAdapter::new(fetcher, Some("test-key".into()), Some("engine".into()))
        .with_endpoint(format!("{}/customsearch/v1", mock_server.uri()));

    let results = adapter
        .search(&["렉".to_string()], "inven.co.kr", 10)
        .await
        .expect("search should succeed");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "서버 렉");
}

#[tokio::test]
async fn test_network_failure_becomes_provider_error() {
    // Nothing listens on this port
    let fetcher = Arc::new(ReqwestFetcher::new(&HttpConfig::default()).unwrap());
    let adapter = DuckDuckGoAdapter::with_endpoint(fetcher, "http://127.0.0.1:9/html/");

    let err = adapter
        .search(&["렉".to_string()], "inven.co.kr", 10)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Network { .. }));
    // Transport failures are not throttling
    assert!(adapter.is_available());
}

#[tokio::test]
async fn test_adapters_share_stub_fetcher() {
    let fetcher = Arc::new(StubFetcher::new());
    let adapter = DuckDuckGoAdapter::new(fetcher.clone());

    // Unscripted URLs answer 404
    let err = adapter
        .search(&["렉".to_string()], "inven.co.kr", 10)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Network { .. }));
    assert_eq!(fetcher.requests().len(), 1);
    assert!(fetcher.requests()[0].starts_with("https://html.duckduckgo.com/html/?q="));
}

#[tokio::test]
async fn test_google_transport_failure_hides_api_key() {
    // Nothing listens on this port
    let fetcher = Arc::new(ReqwestFetcher::new(&HttpConfig::default()).unwrap());
    let adapter = GoogleCseAdapter::new(
        fetcher,
        Some("SECRET_API_KEY_123".into()),
        Some("cx1".into()),
    )
    .with_endpoint("http://127.0.0.1:9/customsearch/v1");

    let err = adapter
        .search(&["렉".to_string()], "inven.co.kr", 10)
        .await
        .unwrap_err();

    let shown = format!("{err} {err:?}");
    assert!(matches!(err, ProviderError::Network { .. }));
    assert!(!shown.contains("SECRET_API_KEY_123"), "key leaked: {shown}");
}
