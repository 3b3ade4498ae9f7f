//! Crawl manager - bounded-concurrency scheduling over the frontier
//!
//! One control task owns the frontier; at most `concurrency` fetch
//! workers run at a time, reporting through a single bounded channel.
//! The loop fills free slots from the pending range, blocks for the next
//! completion, records it (which re-enqueues discovered links), and
//! stops when the frontier drains or the result ceiling is reached.

use crate::config::{ConfigSpider, SpiderOptions};
use crate::crawler::fetcher::{build_http_client, fetch_page};
use crate::frontier::{CrawlRequest, CrawlResult, Frontier};
use crate::RugburnError;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// How a crawl run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// The frontier drained with nothing in flight
    Exhausted { results: u64 },

    /// The configured result ceiling was reached; in-flight fetches were
    /// abandoned
    CeilingReached { results: u64 },
}

impl CrawlOutcome {
    /// The number of recorded results at termination
    pub fn results(&self) -> u64 {
        match self {
            Self::Exhausted { results } | Self::CeilingReached { results } => *results,
        }
    }
}

/// Orchestrates fetch workers against the frontier
pub struct CrawlManager<'f> {
    frontier: &'f Frontier,
    client: Client,
    spider: Arc<ConfigSpider>,
    budget: usize,
    ceiling: Option<u64>,
}

impl<'f> CrawlManager<'f> {
    /// Creates a manager for one crawl run
    pub fn new(
        frontier: &'f Frontier,
        spider: ConfigSpider,
        options: &SpiderOptions,
    ) -> Result<Self, RugburnError> {
        Ok(Self {
            frontier,
            client: build_http_client()?,
            spider: Arc::new(spider),
            budget: options.concurrency,
            ceiling: options.ceiling(),
        })
    }

    /// Runs the crawl to completion
    ///
    /// Seeds the frontier, then alternates between filling worker slots
    /// and draining completions. Returns how the run ended; every
    /// consumed completion has been recorded durably by then.
    pub async fn run(&self) -> Result<CrawlOutcome, RugburnError> {
        self.seed()?;

        let (tx, mut rx) = mpsc::channel::<CrawlResult>(self.budget);
        let mut in_flight: HashSet<String> = HashSet::new();
        let started = Instant::now();

        loop {
            self.fill_slots(&tx, &mut in_flight)?;

            if in_flight.is_empty() {
                let results = self.frontier.result_count()?;
                tracing::info!(
                    "Crawl exhausted: {} results recorded in {:?}",
                    results,
                    started.elapsed()
                );
                return Ok(CrawlOutcome::Exhausted { results });
            }

            let result = match rx.recv().await {
                Some(result) => result,
                // Cannot happen while this loop holds a sender
                None => continue,
            };

            in_flight.remove(result.url.as_str());
            match &result.error {
                Some(error) => tracing::warn!("Fetch failed for {}: {}", result.url, error),
                None => tracing::debug!(
                    "Fetched {} ({} outbound links)",
                    result.url,
                    result.children.len()
                ),
            }
            self.frontier.record_result(&result)?;

            if let Some(ceiling) = self.ceiling {
                let results = self.frontier.result_count()?;
                if results >= ceiling {
                    tracing::info!(
                        "Result ceiling {} reached after {:?}; abandoning {} in-flight fetches",
                        ceiling,
                        started.elapsed(),
                        in_flight.len()
                    );
                    return Ok(CrawlOutcome::CeilingReached { results });
                }
            }
        }
    }

    /// Enqueues every seed URL that has no recorded result yet
    ///
    /// Seeds with results are left alone, so re-running against a
    /// fully-populated store terminates without fetching anything.
    fn seed(&self) -> Result<(), RugburnError> {
        for url in &self.spider.urls {
            if self.frontier.has_result(url)? {
                tracing::debug!("Seed {} already has a result, skipping", url);
                continue;
            }
            self.frontier.enqueue(&CrawlRequest::new(url.clone()))?;
        }
        Ok(())
    }

    /// Dispatches pending requests until the budget is exhausted or no
    /// dispatchable request remains
    fn fill_slots(
        &self,
        tx: &mpsc::Sender<CrawlResult>,
        in_flight: &mut HashSet<String>,
    ) -> Result<(), RugburnError> {
        while in_flight.len() < self.budget {
            match self.next_dispatchable(in_flight)? {
                Some(request) => {
                    in_flight.insert(request.url.clone());
                    self.dispatch(request, tx.clone());
                }
                None => break,
            }
        }
        Ok(())
    }

    /// Finds the first pending request that is neither in flight nor
    /// already resolved
    ///
    /// Pending requests whose result already exists (left over from a
    /// previous run, or enqueued by two parents racing) are deleted
    /// without consuming a slot, after the scan's iterator is released.
    fn next_dispatchable(
        &self,
        in_flight: &HashSet<String>,
    ) -> Result<Option<CrawlRequest>, RugburnError> {
        let mut stale = Vec::new();
        let mut found = None;

        for item in self.frontier.pending_requests() {
            let request = item?;
            if in_flight.contains(request.url.as_str()) {
                continue;
            }
            if self.frontier.has_result(&request.url)? {
                stale.push(request.url);
                continue;
            }
            found = Some(request);
            break;
        }

        for url in stale {
            self.frontier.remove_request(&url)?;
        }

        Ok(found)
    }

    /// Spawns one fetch worker for `request`
    fn dispatch(&self, request: CrawlRequest, tx: mpsc::Sender<CrawlResult>) {
        let client = self.client.clone();
        let spider = Arc::clone(&self.spider);
        tokio::spawn(async move {
            let result = fetch_page(&client, request, &spider).await;
            // The receiver is gone once the ceiling stops the crawl;
            // late completions are dropped on the floor
            let _ = tx.send(result).await;
        });
    }
}
