//! Service facade consumed by the serving layer
//!
//! Resolves the scraper for a site, runs the scrape under an optional
//! deadline and persists what it produced.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::registry::ScraperRegistry;
use crate::application::scraper::ScrapeError;
use crate::domain::Product;
use crate::domain::repositories::{ProductRepository, StoreError};
use crate::infrastructure::config::defaults;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Scraper not found for website: {0}")]
    ScraperNotFound(String),

    #[error("Scraping {target} timed out after {timeout:?}")]
    Timeout { target: String, timeout: Duration },

    #[error("Failed to scrape: {0}")]
    Scrape(#[from] ScrapeError),

    #[error("Failed to store product: {0}")]
    Store(#[from] StoreError),
}

pub struct ProductService {
    registry: Arc<ScraperRegistry>,
    store: Arc<dyn ProductRepository>,
    default_max_results: usize,
    timeout: Option<Duration>,
}

impl ProductService {
    pub fn new(registry: Arc<ScraperRegistry>, store: Arc<dyn ProductRepository>) -> Self {
        Self {
            registry,
            store,
            default_max_results: defaults::MAX_RESULTS,
            timeout: None,
        }
    }

    /// Abort scrapes that run longer than `timeout`
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Result cap used when a search does not specify one
    #[must_use]
    pub fn with_default_max_results(mut self, max_results: usize) -> Self {
        self.default_max_results = max_results;
        self
    }

    /// Scrape a product page and save the product
    pub async fn scrape_product(&self, url: &str, website: &str) -> Result<Product, ServiceError> {
        let scraper = self
            .registry
            .get(website)
            .ok_or_else(|| ServiceError::ScraperNotFound(website.to_string()))?;

        let product = self.with_deadline(url, scraper.scrape_product(url)).await?;
        self.store.save(&product).await?;

        info!("Saved product {} from {}", product.id, url);
        Ok(product)
    }

    /// Search a site and save every product found
    ///
    /// `None` or zero uses the default cap. A product that fails to save is
    /// logged and still returned.
    pub async fn scrape_search(
        &self,
        keyword: &str,
        website: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<Product>, ServiceError> {
        let max_results = max_results
            .filter(|max| *max > 0)
            .unwrap_or(self.default_max_results);
        let scraper = self
            .registry
            .get(website)
            .ok_or_else(|| ServiceError::ScraperNotFound(website.to_string()))?;

        let products = self
            .with_deadline(keyword, scraper.scrape_search(keyword, max_results))
            .await?;

        for product in &products {
            if let Err(e) = self.store.save(product).await {
                warn!("Failed to save product {}: {}", product.id, e);
            }
        }

        info!("Search '{}' on {} returned {} products", keyword, website, products.len());
        Ok(products)
    }

    pub async fn get_all(&self) -> Result<Vec<Product>, ServiceError> {
        Ok(self.store.get_all().await?)
    }

    /// Absence is `Ok(None)`
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Product>, ServiceError> {
        Ok(self.store.get_by_id(id).await?)
    }

    async fn with_deadline<T>(
        &self,
        target: &str,
        scrape: impl Future<Output = Result<T, ScrapeError>>,
    ) -> Result<T, ServiceError> {
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, scrape)
                .await
                .map_err(|_| ServiceError::Timeout {
                    target: target.to_string(),
                    timeout,
                })?
                .map_err(ServiceError::from),
            None => Ok(scrape.await?),
        }
    }
}
