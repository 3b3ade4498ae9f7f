//! Crawl frontier persisted in the store
//!
//! All crawl state lives in two key ranges plus one counter:
//!
//! - `req-<url>`: pending fetch requests
//! - `res-<url>`: completed results, at most one per URL ever
//! - `count-res`: durable result counter, kept equal to the number of
//!   `res-` keys by writing both in one atomic batch
//!
//! Records are JSON documents carrying an explicit `schema` version;
//! decoding rejects versions it does not understand.

use crate::store::{Batch, Store, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Key prefix for pending requests
pub const REQUEST_PREFIX: &str = "req-";

/// Key prefix for completed results
pub const RESULT_PREFIX: &str = "res-";

/// Reserved key holding the durable result counter (ASCII decimal)
pub const RESULT_COUNT_KEY: &str = "count-res";

/// Reserved key holding the hash of the config this store was built with
pub const CONFIG_HASH_KEY: &str = "meta-config-hash";

const SCHEMA_VERSION: u8 = 1;

/// A pending fetch for one URL
///
/// The crawl configuration is shared per run rather than serialized into
/// every request; the stored record is just the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlRequest {
    pub url: String,
}

impl CrawlRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// The recorded outcome of fetching one URL
///
/// `error` and `body` are mutually exclusive: a failed fetch carries the
/// error string and an empty body, a successful one the raw body and the
/// outbound links discovered in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub url: String,
    pub error: Option<String>,
    pub body: String,
    pub children: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

impl CrawlResult {
    /// Builds a successful result
    pub fn success(url: impl Into<String>, body: String, children: Vec<String>) -> Self {
        Self {
            url: url.into(),
            error: None,
            body,
            children,
            fetched_at: Utc::now(),
        }
    }

    /// Builds a failed result; the error is recorded, nothing is retried
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            error: Some(error.into()),
            body: String::new(),
            children: Vec::new(),
            fetched_at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T: Serialize> {
    schema: u8,
    #[serde(flatten)]
    record: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    schema: u8,
    #[serde(flatten)]
    record: T,
}

fn encode<T: Serialize>(record: &T) -> StoreResult<Vec<u8>> {
    Ok(serde_json::to_vec(&EnvelopeRef {
        schema: SCHEMA_VERSION,
        record,
    })?)
}

fn decode<T: DeserializeOwned>(key: &[u8], bytes: &[u8]) -> StoreResult<T> {
    let corrupt = |message: String| StoreError::CorruptRecord {
        key: String::from_utf8_lossy(key).into_owned(),
        message,
    };
    let envelope: Envelope<T> =
        serde_json::from_slice(bytes).map_err(|e| corrupt(e.to_string()))?;
    if envelope.schema != SCHEMA_VERSION {
        return Err(corrupt(format!(
            "unsupported schema version {}",
            envelope.schema
        )));
    }
    Ok(envelope.record)
}

fn request_key(url: &str) -> Vec<u8> {
    format!("{}{}", REQUEST_PREFIX, url).into_bytes()
}

fn result_key(url: &str) -> Vec<u8> {
    format!("{}{}", RESULT_PREFIX, url).into_bytes()
}

/// The crawl frontier: pending requests and recorded results
///
/// The crawl manager is the sole writer; the extraction engine reads
/// results through [`Frontier::results`] after the crawl finishes.
pub struct Frontier {
    store: Arc<dyn Store>,
}

impl Frontier {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// The underlying store (meta keys, tests)
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Enqueues a request; enqueueing the same URL again is an upsert
    pub fn enqueue(&self, request: &CrawlRequest) -> StoreResult<()> {
        self.store
            .put(&request_key(&request.url), &encode(request)?)
    }

    /// Returns the lexicographically-first pending request without
    /// removing it
    pub fn dequeue_next(&self) -> StoreResult<Option<CrawlRequest>> {
        self.pending_requests().next().transpose()
    }

    /// Whether a result has ever been recorded for `url`
    pub fn has_result(&self, url: &str) -> StoreResult<bool> {
        self.store.contains(&result_key(url))
    }

    /// Drops a pending request, if present
    pub fn remove_request(&self, url: &str) -> StoreResult<()> {
        self.store.delete(&request_key(url))
    }

    /// Records a result atomically
    ///
    /// One batch writes the result, increments the counter, deletes the
    /// consumed request, and enqueues a request per child URL that has no
    /// result yet. Recording a URL that already has a result is a no-op,
    /// upholding the at-most-one-result invariant.
    pub fn record_result(&self, result: &CrawlResult) -> StoreResult<()> {
        if self.has_result(&result.url)? {
            return Ok(());
        }

        let count = self.result_count()?;
        let mut batch = Batch::new();
        batch.put(result_key(&result.url), encode(result)?);
        batch.put(RESULT_COUNT_KEY, (count + 1).to_string());
        batch.delete(request_key(&result.url));

        for child in &result.children {
            if child == &result.url || self.has_result(child)? {
                continue;
            }
            batch.put(request_key(child), encode(&CrawlRequest::new(child.clone()))?);
        }

        self.store.apply(batch)
    }

    /// The number of recorded results
    pub fn result_count(&self) -> StoreResult<u64> {
        let raw = match self.store.get(RESULT_COUNT_KEY.as_bytes())? {
            Some(raw) => raw,
            None => return Ok(0),
        };
        let text = std::str::from_utf8(&raw).map_err(|e| StoreError::CorruptRecord {
            key: RESULT_COUNT_KEY.to_string(),
            message: e.to_string(),
        })?;
        text.parse::<u64>().map_err(|e| StoreError::CorruptRecord {
            key: RESULT_COUNT_KEY.to_string(),
            message: e.to_string(),
        })
    }

    /// The number of pending requests
    pub fn count_pending(&self) -> StoreResult<u64> {
        let mut count = 0;
        for item in self.store.iter_prefix(REQUEST_PREFIX.as_bytes()) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    /// Lazily iterates pending requests in lexicographic URL order
    pub fn pending_requests(&self) -> impl Iterator<Item = StoreResult<CrawlRequest>> + '_ {
        self.store
            .iter_prefix(REQUEST_PREFIX.as_bytes())
            .map(|item| {
                let (key, value) = item?;
                decode(&key, &value)
            })
    }

    /// Lazily iterates recorded results in lexicographic URL order
    pub fn results(&self) -> impl Iterator<Item = StoreResult<CrawlResult>> + '_ {
        self.store
            .iter_prefix(RESULT_PREFIX.as_bytes())
            .map(|item| {
                let (key, value) = item?;
                decode(&key, &value)
            })
    }
}
