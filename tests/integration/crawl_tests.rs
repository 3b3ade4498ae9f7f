//! End-to-end crawl behavior against mock HTTP servers

use crate::{anchor_spider, memory_frontier, page_with_links, spider_options};
use rugburn::config::{StoreOptions, StoreStrategy};
use rugburn::crawler::{CrawlManager, CrawlOutcome};
use rugburn::frontier::Frontier;
use rugburn::store::open_store;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

#[tokio::test]
async fn test_single_page_without_links_fetches_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(page_with_links(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let frontier = memory_frontier();
    let seed = format!("{}/", mock_server.uri());
    let manager = CrawlManager::new(&frontier, anchor_spider(vec![seed.clone()]), &spider_options(1, 0))
        .expect("Failed to build manager");

    let outcome = manager.run().await.expect("Crawl failed");

    assert_eq!(outcome, CrawlOutcome::Exhausted { results: 1 });
    assert_eq!(frontier.result_count().unwrap(), 1);
    assert_eq!(frontier.count_pending().unwrap(), 0);

    let result = frontier.results().next().unwrap().unwrap();
    assert_eq!(result.url, seed);
    assert!(!result.is_error());
    assert!(result.body.contains("<title>page</title>"));
    assert!(result.children.is_empty());
}

#[tokio::test]
async fn test_linear_chain_visits_each_page_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(page_with_links(&["/b"])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_response(page_with_links(&["/c"])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(html_response(page_with_links(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let frontier = memory_frontier();
    let seed = format!("{}/", mock_server.uri());
    let manager = CrawlManager::new(&frontier, anchor_spider(vec![seed]), &spider_options(1, 0))
        .expect("Failed to build manager");

    let outcome = manager.run().await.expect("Crawl failed");

    assert_eq!(outcome, CrawlOutcome::Exhausted { results: 3 });
    assert_eq!(frontier.result_count().unwrap(), 3);
    assert_eq!(frontier.count_pending().unwrap(), 0);
    assert_eq!(frontier.results().count(), 3);
}

#[tokio::test]
async fn test_ceiling_stops_crawl_with_requests_still_pending() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(page_with_links(&["/b"])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_response(page_with_links(&["/c"])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let frontier = memory_frontier();
    let seed = format!("{}/", mock_server.uri());
    let manager = CrawlManager::new(&frontier, anchor_spider(vec![seed]), &spider_options(1, 1))
        .expect("Failed to build manager");

    let outcome = manager.run().await.expect("Crawl failed");

    assert_eq!(outcome, CrawlOutcome::CeilingReached { results: 1 });
    assert_eq!(frontier.result_count().unwrap(), 1);
    assert!(frontier.count_pending().unwrap() >= 1);
}

#[tokio::test]
async fn test_shared_child_is_fetched_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(page_with_links(&["/left", "/right"])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/left"))
        .respond_with(html_response(page_with_links(&["/shared"])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/right"))
        .respond_with(html_response(page_with_links(&["/shared"])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shared"))
        .respond_with(html_response(page_with_links(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let frontier = memory_frontier();
    let seed = format!("{}/", mock_server.uri());
    let manager = CrawlManager::new(&frontier, anchor_spider(vec![seed]), &spider_options(2, 0))
        .expect("Failed to build manager");

    let outcome = manager.run().await.expect("Crawl failed");

    assert_eq!(outcome.results(), 4);
    assert_eq!(frontier.results().count(), 4);
    assert_eq!(frontier.count_pending().unwrap(), 0);
}

#[tokio::test]
async fn test_server_error_is_recorded_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let frontier = memory_frontier();
    let seed = format!("{}/", mock_server.uri());
    let manager = CrawlManager::new(&frontier, anchor_spider(vec![seed.clone()]), &spider_options(1, 0))
        .expect("Failed to build manager");

    let outcome = manager.run().await.expect("Crawl failed");

    assert_eq!(outcome, CrawlOutcome::Exhausted { results: 1 });
    assert_eq!(frontier.count_pending().unwrap(), 0);

    let result = frontier.results().next().unwrap().unwrap();
    assert_eq!(result.url, seed);
    assert_eq!(result.error.as_deref(), Some("Internal Server Error"));
    assert!(result.body.is_empty());
    assert!(result.children.is_empty());
}

#[tokio::test]
async fn test_transport_failure_is_recorded() {
    // Point the crawl at a server that is not listening
    let mock_server = MockServer::start().await;
    let seed = format!("{}/", mock_server.uri());
    drop(mock_server);

    let frontier = memory_frontier();
    let manager = CrawlManager::new(&frontier, anchor_spider(vec![seed.clone()]), &spider_options(1, 0))
        .expect("Failed to build manager");

    let outcome = manager.run().await.expect("Crawl failed");

    assert_eq!(outcome.results(), 1);
    let result = frontier.results().next().unwrap().unwrap();
    assert!(result.is_error());
    assert!(result.error.as_deref().map(|e| !e.is_empty()).unwrap_or(false));
}

#[tokio::test]
async fn test_rerun_against_populated_store_fetches_nothing() {
    let mock_server = MockServer::start().await;

    // Each page may be fetched exactly once across BOTH runs
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(page_with_links(&["/b"])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_response(page_with_links(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let store_options = StoreOptions {
        strategy: StoreStrategy::Disk,
        path: dir.path().to_string_lossy().into_owned(),
    };
    let seed = format!("{}/", mock_server.uri());

    {
        let frontier = Frontier::new(open_store(&store_options).unwrap());
        let manager =
            CrawlManager::new(&frontier, anchor_spider(vec![seed.clone()]), &spider_options(1, 0))
                .expect("Failed to build manager");
        let outcome = manager.run().await.expect("First crawl failed");
        assert_eq!(outcome.results(), 2);
    }

    // Reopen the same store and run the identical crawl again
    let frontier = Frontier::new(open_store(&store_options).unwrap());
    let manager = CrawlManager::new(&frontier, anchor_spider(vec![seed]), &spider_options(1, 0))
        .expect("Failed to build manager");
    let outcome = manager.run().await.expect("Second crawl failed");

    assert_eq!(outcome, CrawlOutcome::Exhausted { results: 2 });
    assert_eq!(frontier.result_count().unwrap(), 2);
}
