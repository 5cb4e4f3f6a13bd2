//! Infrastructure layer for configuration, logging, fetching, parsing and storage
//!
//! This module provides the HTTP client and polite crawler, the
//! selector-fallback parsers, and the JSON snapshot product store.

pub mod config;
pub mod crawler;
pub mod http_client;
pub mod logging;
pub mod parsing;
pub mod parsing_error;
pub mod product_store;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager, LoggingConfig, ScrapingConfig};
pub use crawler::{Crawler, CrawlerConfig, FetchedPage, LimitRule};
pub use http_client::{FetchError, HttpClient, HttpClientConfig};
pub use logging::{init_logging, init_logging_with_config};
pub use parsing::{ParsingError, ParsingResult, ProductDetailParser, SearchResultParser};
pub use product_store::JsonFileProductStore;
