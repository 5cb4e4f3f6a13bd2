//! Site key to scraper dispatch table

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::application::rakuten_scraper::RakutenScraper;
use crate::application::scraper::Scraper;
use crate::infrastructure::config::{ScrapingConfig, rakuten};

/// Registered scrapers keyed by site, e.g. "rakuten"
///
/// Looking up an unknown site is not an error here; callers decide how to
/// report it.
#[derive(Default, Clone)]
pub struct ScraperRegistry {
    scrapers: HashMap<String, Arc<dyn Scraper>>,
}

impl ScraperRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every supported site registered
    pub fn with_defaults(scraping: &ScrapingConfig) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(
            rakuten::SITE_KEY,
            Arc::new(RakutenScraper::with_config(scraping, rakuten::SEARCH_BASE_URL)?),
        );
        info!("Registered scrapers: {:?}", registry.sites());
        Ok(registry)
    }

    /// Add or replace the scraper for `site`, returning the one replaced
    pub fn register(&mut self, site: impl Into<String>, scraper: Arc<dyn Scraper>) -> Option<Arc<dyn Scraper>> {
        self.scrapers.insert(site.into(), scraper)
    }

    pub fn get(&self, site: &str) -> Option<Arc<dyn Scraper>> {
        self.scrapers.get(site).cloned()
    }

    /// Registered site keys, sorted
    pub fn sites(&self) -> Vec<&str> {
        let mut sites: Vec<&str> = self.scrapers.keys().map(String::as_str).collect();
        sites.sort_unstable();
        sites
    }
}
