//! Configuration loading and validation
//!
//! The rug file is a single JSON document declaring the crawl (seeds,
//! link rules, concurrency, ceiling), the store backend, and any number
//! of extraction jobs. It is loaded and fully validated before any work
//! starts.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{
    ConfigOptions, ConfigScraper, ConfigSpider, RugFile, SpiderOptions, StoreOptions,
    StoreStrategy,
};
pub use validation::validate;
