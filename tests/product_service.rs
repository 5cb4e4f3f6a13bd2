//! Service facade over stub scrapers and a real snapshot store

use async_trait::async_trait;
use price_tracker::application::{ProductService, ScrapeError, Scraper, ScraperRegistry, ServiceError};
use price_tracker::domain::Product;
use price_tracker::infrastructure::JsonFileProductStore;
use price_tracker::infrastructure::parsing::ParsingError;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

#[derive(Default)]
struct StubScraper {
    last_max_results: AtomicUsize,
    delay: Option<Duration>,
}

#[async_trait]
impl Scraper for StubScraper {
    async fn scrape_product(&self, url: &str) -> Result<Product, ScrapeError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if url.contains("broken") {
            return Err(ParsingError::extraction_failed(url).into());
        }
        Ok(Product::new("p1", "Stub product", url, "stub", 500.0, "JPY"))
    }

    async fn scrape_search(&self, keyword: &str, max_results: usize) -> Result<Vec<Product>, ScrapeError> {
        self.last_max_results.store(max_results, Ordering::SeqCst);
        Ok((0..3)
            .map(|i| {
                Product::new(
                    format!("{keyword}-{i}"),
                    format!("{keyword} {i}"),
                    format!("https://example.com/{i}"),
                    "stub",
                    100.0,
                    "JPY",
                )
            })
            .collect())
    }
}

async fn service_with(scraper: Arc<StubScraper>, dir: &TempDir) -> ProductService {
    let mut registry = ScraperRegistry::new();
    registry.register("stub", scraper);
    let store = JsonFileProductStore::open(dir.path().join("products.json"))
        .await
        .unwrap();
    ProductService::new(Arc::new(registry), Arc::new(store))
}

#[tokio::test]
async fn scrape_product_saves_result() {
    let dir = TempDir::new().unwrap();
    let service = service_with(Arc::new(StubScraper::default()), &dir).await;

    let product = service.scrape_product("https://example.com/p1", "stub").await.unwrap();

    assert_eq!(service.get_by_id("p1").await.unwrap(), Some(product));
    assert_eq!(service.get_all().await.unwrap().len(), 1);
    assert!(service.get_by_id("other").await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_website_is_scraper_not_found() {
    let dir = TempDir::new().unwrap();
    let service = service_with(Arc::new(StubScraper::default()), &dir).await;

    let error = service.scrape_product("https://example.com/p1", "amazon").await.unwrap_err();
    assert!(matches!(error, ServiceError::ScraperNotFound(ref site) if site == "amazon"));
    assert_eq!(error.to_string(), "Scraper not found for website: amazon");

    assert!(matches!(
        service.scrape_search("tea", "", None).await,
        Err(ServiceError::ScraperNotFound(_))
    ));
}

#[tokio::test]
async fn extraction_failure_is_reported_and_nothing_saved() {
    let dir = TempDir::new().unwrap();
    let service = service_with(Arc::new(StubScraper::default()), &dir).await;

    assert!(matches!(
        service.scrape_product("https://example.com/broken", "stub").await,
        Err(ServiceError::Scrape(ScrapeError::Extraction(_)))
    ));
    assert!(service.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn search_defaults_max_results() {
    let dir = TempDir::new().unwrap();
    let scraper = Arc::new(StubScraper::default());
    let service = service_with(Arc::clone(&scraper), &dir).await;

    let products = service.scrape_search("tea", "stub", None).await.unwrap();
    assert_eq!(products.len(), 3);
    assert_eq!(scraper.last_max_results.load(Ordering::SeqCst), 10);

    service.scrape_search("tea", "stub", Some(0)).await.unwrap();
    assert_eq!(scraper.last_max_results.load(Ordering::SeqCst), 10);

    service.scrape_search("tea", "stub", Some(5)).await.unwrap();
    assert_eq!(scraper.last_max_results.load(Ordering::SeqCst), 5);

    assert_eq!(service.get_all().await.unwrap().len(), 3);
}

#[tokio::test]
async fn search_save_failures_do_not_fail_the_call() {
    let dir = TempDir::new().unwrap();
    let mut registry = ScraperRegistry::new();
    registry.register("stub", Arc::new(StubScraper::default()));
    let store = JsonFileProductStore::open(dir.path().join("missing").join("products.json"))
        .await
        .unwrap();
    let service = ProductService::new(Arc::new(registry), Arc::new(store));

    let products = service.scrape_search("tea", "stub", None).await.unwrap();
    assert_eq!(products.len(), 3);
    assert!(service.get_all().await.unwrap().is_empty());

    assert!(matches!(
        service.scrape_product("https://example.com/p1", "stub").await,
        Err(ServiceError::Store(_))
    ));
}

#[tokio::test]
async fn slow_scrape_times_out() {
    let dir = TempDir::new().unwrap();
    let scraper = Arc::new(StubScraper {
        delay: Some(Duration::from_secs(5)),
        ..StubScraper::default()
    });
    let service = service_with(scraper, &dir)
        .await
        .with_timeout(Duration::from_millis(50));

    let error = service.scrape_product("https://example.com/p1", "stub").await.unwrap_err();
    assert!(matches!(error, ServiceError::Timeout { .. }));
    assert!(service.get_all().await.unwrap().is_empty());
}
