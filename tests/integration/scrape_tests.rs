//! End-to-end extraction behavior: crawl, then scrape into JSONL

use crate::{anchor_spider, memory_frontier, spider_options};
use rugburn::config::{
    ConfigOptions, ConfigScraper, ConfigSpider, RugFile, SpiderOptions, StoreOptions,
    StoreStrategy,
};
use rugburn::crawler::CrawlManager;
use rugburn::extract::run_scrape_jobs;
use rugburn::frontier::{CrawlResult, Frontier};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONTAINER_PAGE: &str = r#"
    <html>
        <body>
            <div class="container"><span class="title">title1</span></div>
            <div class="container"><span class="title">title2</span></div>
        </body>
    </html>
"#;

fn rug_file(spider: ConfigSpider, scrapers: Vec<ConfigScraper>) -> RugFile {
    RugFile {
        name: "test".to_string(),
        options: ConfigOptions {
            spider: SpiderOptions {
                concurrency: 1,
                max_results: 0,
            },
            store: StoreOptions {
                strategy: StoreStrategy::Memory,
                path: String::new(),
            },
        },
        spider,
        scrapers,
    }
}

fn scraper(output: &str, fields: serde_json::Value) -> ConfigScraper {
    ConfigScraper {
        name: "titles".to_string(),
        test: None,
        context: None,
        fields: fields.as_object().unwrap().clone(),
        transforms: vec![],
        output: output.to_string(),
    }
}

#[tokio::test]
async fn test_crawl_then_scrape_writes_jsonl() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(CONTAINER_PAGE)
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("titles.jsonl");

    let frontier = memory_frontier();
    let seed = format!("{}/", mock_server.uri());
    let manager = CrawlManager::new(&frontier, anchor_spider(vec![seed]), &spider_options(1, 0))
        .expect("Failed to build manager");
    manager.run().await.expect("Crawl failed");

    let mut job = scraper(output.to_str().unwrap(), json!({"title": "//span/text()"}));
    job.context = Some("//div[@class='container']".to_string());
    let config = rug_file(anchor_spider(vec![]), vec![job]);

    run_scrape_jobs(&frontier, &config).expect("Scrape failed");

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(content, "{\"title\":\"title1\"}\n{\"title\":\"title2\"}\n");
}

#[tokio::test]
async fn test_scrape_preloaded_store_without_crawl() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.jsonl");

    let frontier = memory_frontier();
    frontier
        .record_result(&CrawlResult::success(
            "https://example.com/",
            CONTAINER_PAGE.to_string(),
            vec![],
        ))
        .unwrap();

    let mut job = scraper(output.to_str().unwrap(), json!({"title": "//span/text()"}));
    job.context = Some("//div".to_string());
    let config = rug_file(anchor_spider(vec![]), vec![job]);

    run_scrape_jobs(&frontier, &config).expect("Scrape failed");

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(content, "{\"title\":\"title1\"}\n{\"title\":\"title2\"}\n");
}

#[tokio::test]
async fn test_gating_xpath_skips_pages_per_job() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.jsonl");

    let frontier = memory_frontier();
    frontier
        .record_result(&CrawlResult::success(
            "https://example.com/articles",
            CONTAINER_PAGE.to_string(),
            vec![],
        ))
        .unwrap();
    frontier
        .record_result(&CrawlResult::success(
            "https://example.com/about",
            "<html><body><p>nothing here</p></body></html>".to_string(),
            vec![],
        ))
        .unwrap();

    let mut job = scraper(output.to_str().unwrap(), json!({"title": "//span/text()"}));
    job.test = Some("//div[@class='container']".to_string());
    job.context = Some("//div[@class='container']".to_string());
    let config = rug_file(anchor_spider(vec![]), vec![job]);

    run_scrape_jobs(&frontier, &config).expect("Scrape failed");

    // Only the page with containers produced records
    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(content.lines().count(), 2);
}

#[tokio::test]
async fn test_transform_pipeline_rewrites_records() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.jsonl");
    let script = dir.path().join("tag.rhai");
    std::fs::write(
        &script,
        r#"
            fn transform(record) {
                record.source = "rugburn";
                record
            }
        "#,
    )
    .unwrap();

    let frontier = memory_frontier();
    frontier
        .record_result(&CrawlResult::success(
            "https://example.com/",
            CONTAINER_PAGE.to_string(),
            vec![],
        ))
        .unwrap();

    let mut job = scraper(output.to_str().unwrap(), json!({"title": "//span/text()"}));
    job.context = Some("//div[@class='container']".to_string());
    job.transforms = vec![script.to_string_lossy().into_owned()];
    let config = rug_file(anchor_spider(vec![]), vec![job]);

    run_scrape_jobs(&frontier, &config).expect("Scrape failed");

    let content = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["title"], "title1");
    assert_eq!(first["source"], "rugburn");
}

#[tokio::test]
async fn test_rerunning_job_appends_to_output() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.jsonl");

    let frontier = memory_frontier();
    frontier
        .record_result(&CrawlResult::success(
            "https://example.com/",
            "<div><span>hi</span></div>".to_string(),
            vec![],
        ))
        .unwrap();

    let config = rug_file(
        anchor_spider(vec![]),
        vec![scraper(output.to_str().unwrap(), json!({"title": "//span/text()"}))],
    );

    run_scrape_jobs(&frontier, &config).expect("First scrape failed");
    run_scrape_jobs(&frontier, &config).expect("Second scrape failed");

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(content, "{\"title\":\"hi\"}\n{\"title\":\"hi\"}\n");
}
