//! HTTP fetch worker
//!
//! One fetch is a pure function from a pending request to a recorded
//! result. Workers share nothing with each other and never touch the
//! store; whatever happens (transport failure, error status, unparsable
//! body) comes back as a `CrawlResult`, never as an abort.

use crate::config::ConfigSpider;
use crate::dom::{self, Document, Xpath};
use crate::frontier::{CrawlRequest, CrawlResult};
use reqwest::Client;
use url::Url;

/// Builds the HTTP client shared by all fetch workers
///
/// Redirects are followed transparently; there is no per-fetch timeout,
/// so a hung server stalls one concurrency slot until it responds.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("rugburn/", env!("CARGO_PKG_VERSION")))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one URL and reports the outcome
///
/// Transport failures and status >= 400 are recorded as results carrying
/// the error string (the status' canonical reason phrase where one
/// exists), with no body and no children. A body that cannot be parsed is
/// recorded the same way. On success the raw body is kept verbatim and
/// outbound links are extracted per the configured XPath expressions.
pub async fn fetch_page(client: &Client, request: CrawlRequest, spider: &ConfigSpider) -> CrawlResult {
    let url = match Url::parse(&request.url) {
        Ok(url) => url,
        Err(e) => return CrawlResult::failed(request.url, format!("invalid URL: {}", e)),
    };

    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => return CrawlResult::failed(request.url, e.to_string()),
    };

    let status = response.status();
    if status.as_u16() >= 400 {
        let reason = status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        return CrawlResult::failed(request.url, reason);
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return CrawlResult::failed(request.url, e.to_string()),
    };

    let document = match Document::parse(&body) {
        Ok(document) => document,
        Err(e) => return CrawlResult::failed(request.url, e.to_string()),
    };

    let children = extract_links(&document, &url, &spider.links);
    CrawlResult::success(request.url, body, children)
}

/// Extracts outbound links in match order across the given expressions
///
/// Matched values are resolved against `base` (the fetched page's URL).
/// Malformed expressions and malformed link values are logged and
/// skipped; duplicates are kept, the frontier deduplicates.
pub fn extract_links(document: &Document, base: &Url, expressions: &[String]) -> Vec<String> {
    let mut children = Vec::new();

    for expr in expressions {
        let xpath = match Xpath::compile(expr) {
            Ok(xpath) => xpath,
            Err(e) => {
                tracing::warn!("Skipping link expression: {}", e);
                continue;
            }
        };

        let items = match xpath.select(document) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("Skipping link expression: {}", e);
                continue;
            }
        };

        for item in &items {
            let value = dom::item_text(document, item);
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match base.join(value) {
                Ok(resolved) => children.push(resolved.to_string()),
                Err(e) => tracing::debug!("Skipping malformed link '{}': {}", value, e),
            }
        }
    }

    children
}
