//! Scraper capability shared by every supported site

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Product;
use crate::infrastructure::parsing::ParsingError;

#[derive(Error, Debug)]
pub enum ScrapeError {
    /// No product could be built from the crawled pages
    #[error(transparent)]
    Extraction(#[from] ParsingError),

    #[error("cannot build search URL for '{keyword}': {reason}")]
    InvalidSearchUrl { keyword: String, reason: String },
}

/// A marketplace scraper
///
/// Fetch failures during a crawl are reported through the crawler's error
/// hook; they only surface here when they leave nothing to extract.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Crawl a product page and build the product it describes
    async fn scrape_product(&self, url: &str) -> Result<Product, ScrapeError>;

    /// Crawl the search results for `keyword`, returning at most `max_results`
    async fn scrape_search(&self, keyword: &str, max_results: usize) -> Result<Vec<Product>, ScrapeError>;
}
