use serde::Deserialize;

/// The rug file: one crawl plus any number of extraction jobs
#[derive(Debug, Clone, Deserialize)]
pub struct RugFile {
    /// Human-readable name for logs
    #[serde(default)]
    pub name: String,

    pub options: ConfigOptions,

    pub spider: ConfigSpider,

    #[serde(default)]
    pub scrapers: Vec<ConfigScraper>,
}

/// Runtime options
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigOptions {
    pub spider: SpiderOptions,
    pub store: StoreOptions,
}

/// Crawl engine options
#[derive(Debug, Clone, Deserialize)]
pub struct SpiderOptions {
    /// Maximum number of concurrently executing fetches
    pub concurrency: usize,

    /// Stop after this many recorded results; 0 means unbounded
    #[serde(default)]
    pub max_results: u64,
}

impl SpiderOptions {
    /// The result ceiling, if one is configured
    pub fn ceiling(&self) -> Option<u64> {
        if self.max_results > 0 {
            Some(self.max_results)
        } else {
            None
        }
    }
}

/// Store backend selection
#[derive(Debug, Clone, Deserialize)]
pub struct StoreOptions {
    pub strategy: StoreStrategy,

    /// Directory for the durable backend
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_path() -> String {
    "./db".to_string()
}

/// Available store backends
///
/// Any other strategy string fails decoding, which aborts before setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStrategy {
    Disk,
    Memory,
}

/// The crawl declaration: where to start and which links to follow
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSpider {
    /// Seed URLs
    pub urls: Vec<String>,

    /// XPath expressions selecting outbound links, evaluated in order
    #[serde(default)]
    pub links: Vec<String>,
}

/// One extraction job
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigScraper {
    /// Job name for logs
    #[serde(default)]
    pub name: String,

    /// Gating XPath: pages where this matches nothing are skipped
    #[serde(default)]
    pub test: Option<String>,

    /// Context XPath selecting the root node-set; absent means the
    /// document root
    #[serde(default)]
    pub context: Option<String>,

    /// Field map: name -> XPath string, or nested {context?, fields}
    pub fields: serde_json::Map<String, serde_json::Value>,

    /// Transform script paths, applied in order
    #[serde(default)]
    pub transforms: Vec<String>,

    /// Output file (newline-delimited JSON, appended)
    pub output: String,
}
