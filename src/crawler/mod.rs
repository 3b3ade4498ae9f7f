//! Crawl engine: fetch workers and the bounded-concurrency manager

mod fetcher;
mod manager;

pub use fetcher::{build_http_client, extract_links, fetch_page};
pub use manager::{CrawlManager, CrawlOutcome};

use crate::config::RugFile;
use crate::frontier::Frontier;
use crate::Result;

/// Runs the crawl phase declared by `config` against `frontier`
///
/// Seeds the frontier, fetches under the configured concurrency budget
/// until exhaustion or the result ceiling, and returns how the run ended.
pub async fn crawl(config: &RugFile, frontier: &Frontier) -> Result<CrawlOutcome> {
    let manager = CrawlManager::new(frontier, config.spider.clone(), &config.options.spider)?;
    manager.run().await
}
