//! End-to-end runs: discovery through acquisition
//!
//! These tests drive the whole pipeline over an in-memory fetcher, so no
//! real site is ever contacted.

use crate::common::{direct_only_config, ruliweb_listing, ruliweb_post, StubFetcher};
use community_harvest::crawler::{CrawlEvent, CrawlOrchestrator, PostSink};
use community_harvest::PostContent;
use std::sync::{Arc, Mutex};

const RULIWEB_BOARD: &str = "https://bbs.ruliweb.com/community/board/300143";

fn ruliweb_read(id: u32) -> String {
    format!("{RULIWEB_BOARD}/read/{id}")
}

/// Sink remembering the URLs it was handed
#[derive(Default)]
struct Collect {
    urls: Mutex<Vec<String>>,
}

impl PostSink for Collect {
    fn accept(&self, post: &PostContent) {
        self.urls.lock().unwrap().push(post.url.clone());
    }
}

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_full_run_over_board_listing() {
    let fetcher = StubFetcher::new()
        .respond(
            RULIWEB_BOARD,
            200,
            ruliweb_listing(&[
                (101, "패치 이후 프레임 드랍"),
                (102, "오늘 점심 메뉴"),
                (103, "패치 노트 요약"),
            ]),
        )
        .respond(
            &ruliweb_read(101),
            200,
            ruliweb_post(
                "패치 이후 프레임 드랍",
                "패치하고 나서 프레임이 반토막 났습니다",
                &[("댓글러", "저도요"), ("둘째", "옵션 낮추세요")],
            ),
        )
        .respond(
            &ruliweb_read(103),
            200,
            ruliweb_post("패치 노트 요약", "이번 패치 주요 변경점 정리", &[]),
        );
    let fetcher = Arc::new(fetcher);
    let sink = Arc::new(Collect::default());

    let orchestrator = CrawlOrchestrator::with_fetcher(&direct_only_config(), fetcher.clone())
        .with_sink(sink.clone());

    let report = orchestrator
        .run(&keywords(&["패치"]), &keywords(&["ruliweb.com"]))
        .await;

    assert_eq!(report.total_searched, 2);
    assert_eq!(report.total_crawled, 2);
    assert_eq!(report.total_failed, 0);
    assert!(report.events.is_empty());
    assert_eq!(report.success_rate(), 1.0);

    let first = report
        .posts
        .iter()
        .find(|p| p.url == ruliweb_read(101))
        .expect("first post crawled");
    assert_eq!(first.title, "패치 이후 프레임 드랍");
    assert_eq!(first.site, "ruliweb");
    assert_eq!(first.keyword, "패치");
    assert_eq!(first.comment_count(), 2);

    // The off-topic post is never fetched
    assert_eq!(fetcher.hits(&ruliweb_read(102)), 0);
    assert_eq!(sink.urls.lock().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_second_run_reuses_cached_search() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .respond(RULIWEB_BOARD, 200, ruliweb_listing(&[(7, "버그 제보")]))
            .respond(&ruliweb_read(7), 200, ruliweb_post("버그 제보", "버그 있어요", &[])),
    );
    let orchestrator = CrawlOrchestrator::with_fetcher(&direct_only_config(), fetcher.clone());
    let words = keywords(&["버그"]);
    let sites = keywords(&["ruliweb.com"]);

    let (first, _) = orchestrator.search_only(&words, &sites).await;
    let (second, _) = orchestrator.search_only(&words, &sites).await;

    assert_eq!(first, second);
    assert_eq!(fetcher.hits(RULIWEB_BOARD), 1);
}

#[tokio::test(start_paused = true)]
async fn test_throttling_domain_is_abandoned_while_others_continue() {
    let inven: Vec<String> = (1..=3)
        .map(|n| format!("https://www.inven.co.kr/board/lostark/4811/{n}"))
        .collect();

    let mut fetcher = StubFetcher::new().respond(
        &ruliweb_read(55),
        200,
        ruliweb_post("서버 점검 연장", "점검이 또 연장됐네요", &[]),
    );
    for url in &inven {
        fetcher = fetcher.respond(url, 429, "");
    }
    let fetcher = Arc::new(fetcher);

    let orchestrator = CrawlOrchestrator::with_fetcher(&direct_only_config(), fetcher.clone());

    let mut urls = inven.clone();
    urls.push(ruliweb_read(55));
    let report = orchestrator.crawl_urls(&urls, "점검").await;

    assert_eq!(report.total_crawled, 1);
    assert_eq!(report.posts[0].title, "서버 점검 연장");
    assert_eq!(report.total_failed, 3);
    assert_eq!(
        report.events,
        vec![CrawlEvent::DomainAbandoned {
            domain: "www.inven.co.kr".to_string(),
            skipped_urls: 3,
        }]
    );

    // Initial attempt plus three backed-off retries, then nothing more
    assert_eq!(fetcher.hits(&inven[0]), 4);
    assert_eq!(fetcher.hits(&inven[1]), 0);
    assert_eq!(fetcher.hits(&inven[2]), 0);
    assert!(orchestrator.crawler().limiter().is_suspended("www.inven.co.kr").await);
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_site_reports_exhausted_search() {
    let orchestrator =
        CrawlOrchestrator::with_fetcher(&direct_only_config(), Arc::new(StubFetcher::new()));

    let report = orchestrator
        .run(&keywords(&["패치"]), &keywords(&["forum.example.org"]))
        .await;

    assert!(report.posts.is_empty());
    assert_eq!(report.total_searched, 0);
    assert_eq!(report.events.len(), 1);
    match &report.events[0] {
        CrawlEvent::SearchExhausted { site, reason, .. } => {
            assert_eq!(site, "forum.example.org");
            assert!(reason.contains("direct"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_urls_crawled_once() {
    let post = ruliweb_read(9);
    let fetcher = Arc::new(StubFetcher::new().respond(
        &post,
        200,
        ruliweb_post("중복 테스트", "본문", &[]),
    ));
    let orchestrator = CrawlOrchestrator::with_fetcher(&direct_only_config(), fetcher.clone());

    let report = orchestrator
        .crawl_urls(&[post.clone(), format!("{post}/"), post.clone()], "")
        .await;

    assert_eq!(report.total_searched, 1);
    assert_eq!(report.total_crawled, 1);
    assert_eq!(fetcher.hits(&post), 1);
}
