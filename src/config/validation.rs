use crate::config::types::{ConfigScraper, ConfigSpider, RugFile, SpiderOptions};
use crate::dom::Xpath;
use crate::extract::compile_field_map;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// Everything that can fail at runtime from a bad rug file is checked
/// here, before any store or network work starts: the concurrency budget,
/// seed URLs, and every XPath expression in the spider and in every field
/// map.
pub fn validate(config: &RugFile) -> Result<(), ConfigError> {
    validate_spider_options(&config.options.spider)?;
    validate_spider(&config.spider)?;
    for scraper in &config.scrapers {
        validate_scraper(scraper)?;
    }
    Ok(())
}

fn validate_spider_options(options: &SpiderOptions) -> Result<(), ConfigError> {
    if options.concurrency == 0 {
        return Err(ConfigError::Validation(
            "concurrency must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_spider(spider: &ConfigSpider) -> Result<(), ConfigError> {
    for seed in &spider.urls {
        Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("invalid seed URL '{}': {}", seed, e)))?;
    }
    for expr in &spider.links {
        Xpath::compile(expr)?;
    }
    Ok(())
}

fn validate_scraper(scraper: &ConfigScraper) -> Result<(), ConfigError> {
    if scraper.output.is_empty() {
        return Err(ConfigError::Validation(format!(
            "scraper '{}' has an empty output path",
            scraper.name
        )));
    }
    if let Some(expr) = &scraper.test {
        Xpath::compile(expr)?;
    }
    if let Some(expr) = &scraper.context {
        Xpath::compile(expr)?;
    }
    for path in &scraper.transforms {
        if path.is_empty() {
            return Err(ConfigError::Validation(format!(
                "scraper '{}' has an empty transform path",
                scraper.name
            )));
        }
    }
    compile_field_map(&scraper.fields)?;
    Ok(())
}
