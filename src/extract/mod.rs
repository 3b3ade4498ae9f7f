//! Extraction engine
//!
//! Runs each configured scrape job over every persisted crawl result:
//! parse the stored body, check the job's gating query, evaluate the
//! field map once per context root, pipe the records through the
//! transform scripts, and append the survivors to the job's output file.
//!
//! A failing job is logged and skipped; the remaining jobs run
//! unaffected. Store failures abort the whole run.

mod fields;
mod sink;
mod transform;

pub use fields::{compile_field_map, evaluate, FieldMap, FieldSpec, Record};
pub use sink::JsonlSink;
pub use transform::TransformPipeline;

use crate::config::{ConfigScraper, RugFile};
use crate::dom::{Document, DomError, Xpath};
use crate::frontier::Frontier;
use crate::store::StoreError;
use crate::{ConfigError, RugburnError};
use thiserror::Error;

/// Errors that abort a single extraction job
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Job configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Document error: {0}")]
    Dom(#[from] DomError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Transform script '{script}' failed: {message}")]
    Transform { script: String, message: String },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Counters reported per finished job
#[derive(Debug, Default, Clone, Copy)]
pub struct JobStats {
    /// Results with a non-empty body that were considered
    pub pages: u64,

    /// Pages skipped because the gating query matched nothing
    pub skipped: u64,

    /// Records written to the output file
    pub records: u64,
}

/// One prepared scrape job
struct ScrapeJob {
    gate: Option<Xpath>,
    context: Option<Xpath>,
    fields: FieldMap,
    pipeline: TransformPipeline,
    sink: JsonlSink,
}

/// Runs every configured scrape job against the recorded results
///
/// Job failures are logged and isolated; a store failure is fatal and
/// propagates immediately.
pub fn run_scrape_jobs(frontier: &Frontier, config: &RugFile) -> Result<(), RugburnError> {
    for scraper in &config.scrapers {
        let label = if scraper.name.is_empty() {
            scraper.output.as_str()
        } else {
            scraper.name.as_str()
        };

        match run_job(frontier, scraper) {
            Ok(stats) => tracing::info!(
                "Scrape job '{}' finished: {} pages, {} gated out, {} records written",
                label,
                stats.pages,
                stats.skipped,
                stats.records
            ),
            Err(ExtractError::Store(e)) => return Err(RugburnError::Store(e)),
            Err(e) => tracing::error!("Scrape job '{}' failed: {}", label, e),
        }
    }
    Ok(())
}

fn prepare(config: &ConfigScraper) -> Result<ScrapeJob, ExtractError> {
    let gate = match &config.test {
        Some(expr) => Some(Xpath::compile(expr)?),
        None => None,
    };
    let context = match &config.context {
        Some(expr) => Some(Xpath::compile(expr)?),
        None => None,
    };
    let fields = compile_field_map(&config.fields)?;
    let pipeline = TransformPipeline::load(&config.transforms)?;
    let sink = JsonlSink::open(&config.output)?;

    Ok(ScrapeJob {
        gate,
        context,
        fields,
        pipeline,
        sink,
    })
}

fn run_job(frontier: &Frontier, config: &ConfigScraper) -> Result<JobStats, ExtractError> {
    let mut job = prepare(config)?;
    let mut stats = JobStats::default();

    for item in frontier.results() {
        let result = item?;
        if result.body.is_empty() {
            continue;
        }
        stats.pages += 1;

        let document = Document::parse(&result.body)?;

        if let Some(gate) = &job.gate {
            if gate.select(&document)?.is_empty() {
                stats.skipped += 1;
                continue;
            }
        }

        let mut records = Vec::new();
        match &job.context {
            Some(context) => {
                for node in context.select(&document)? {
                    records.push(evaluate(&document, &job.fields, Some(&node))?);
                }
            }
            None => records.push(evaluate(&document, &job.fields, None)?),
        }

        let records = job.pipeline.apply_all(records)?;
        for record in records {
            if record.is_empty() {
                continue;
            }
            job.sink.write(&record)?;
            stats.records += 1;
        }
    }

    job.sink.flush()?;
    Ok(stats)
}
