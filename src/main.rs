//! Rugburn main entry point
//!
//! Command-line interface: load and validate the rug file, open the
//! store, run the crawl phase, then run every scrape job over the
//! recorded results.

use clap::Parser;
use rugburn::config::load_config_with_hash;
use rugburn::frontier::{Frontier, CONFIG_HASH_KEY};
use rugburn::store::open_store;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Rugburn: configuration-driven web crawler and structured-data
/// extractor
#[derive(Parser, Debug)]
#[command(name = "rugburn")]
#[command(version)]
#[command(about = "Configuration-driven web crawler and extractor", long_about = None)]
struct Cli {
    /// Path to the JSON rug file
    #[arg(value_name = "CONFIG", default_value = "./rug.json")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run the crawl phase only
    #[arg(long, conflicts_with = "scrape_only")]
    crawl_only: bool,

    /// Run the scrape jobs only, against an existing store
    #[arg(long, conflicts_with = "crawl_only")]
    scrape_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    if !config.name.is_empty() {
        tracing::info!("Running '{}'", config.name);
    }

    let store = open_store(&config.options.store)?;
    let frontier = Frontier::new(store);
    check_config_hash(&frontier, &config_hash)?;

    if !cli.scrape_only {
        let outcome = rugburn::crawler::crawl(&config, &frontier).await?;
        tracing::info!("Crawl finished with {} recorded results", outcome.results());
    }

    if !cli.crawl_only {
        tracing::info!("Starting scraper..");
        rugburn::extract::run_scrape_jobs(&frontier, &config)?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rugburn=info,warn"),
            1 => EnvFilter::new("rugburn=debug,info"),
            2 => EnvFilter::new("rugburn=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Compares the rug file hash against the one the store was built with
///
/// A mismatch is not fatal: the store stays valid, but results recorded
/// under the old configuration may not match the current declaration.
fn check_config_hash(frontier: &Frontier, hash: &str) -> anyhow::Result<()> {
    let store = frontier.store();
    if let Some(previous) = store.get(CONFIG_HASH_KEY.as_bytes())? {
        if previous != hash.as_bytes() {
            tracing::warn!(
                "Configuration changed since this store was created; \
                 previously recorded results may not match the current declaration"
            );
        }
    }
    store.put(CONFIG_HASH_KEY.as_bytes(), hash.as_bytes())?;
    Ok(())
}
