//! Rugburn: a configuration-driven web crawler and structured-data extractor
//!
//! This crate implements a resumable, deduplicating crawl frontier driving
//! HTTP fetches under a concurrency cap, plus a recursive XPath-based field
//! extraction engine that pipes records through sandboxed transform scripts
//! and writes newline-delimited JSON.

pub mod config;
pub mod crawler;
pub mod dom;
pub mod extract;
pub mod frontier;
pub mod store;

use thiserror::Error;

/// Main error type for Rugburn operations
#[derive(Debug, Error)]
pub enum RugburnError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Extraction error: {0}")]
    Extract(#[from] extract::ExtractError),

    #[error("Document error: {0}")]
    Dom(#[from] dom::DomError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid XPath expression '{expr}': {message}")]
    Xpath { expr: String, message: String },

    #[error("Invalid field map: {0}")]
    FieldMap(String),
}

impl From<dom::DomError> for ConfigError {
    fn from(err: dom::DomError) -> Self {
        match err {
            dom::DomError::Syntax { expr, message } | dom::DomError::Eval { expr, message } => {
                ConfigError::Xpath { expr, message }
            }
            dom::DomError::Parse(message) => ConfigError::Validation(message),
        }
    }
}

/// Result type alias for Rugburn operations
pub type Result<T> = std::result::Result<T, RugburnError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::RugFile;
pub use frontier::{CrawlRequest, CrawlResult, Frontier};
pub use store::{open_store, Store};
