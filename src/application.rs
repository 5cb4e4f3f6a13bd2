//! Application layer module
//!
//! Site scrapers behind a common trait, the registry that maps site keys to
//! them, and the service facade the serving layer calls.

pub mod product_service;
pub mod rakuten_scraper;
pub mod registry;
pub mod scraper;

pub use product_service::{ProductService, ServiceError};
pub use rakuten_scraper::RakutenScraper;
pub use registry::ScraperRegistry;
pub use scraper::{ScrapeError, Scraper};
