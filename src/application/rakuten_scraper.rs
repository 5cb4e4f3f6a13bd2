//! Scraper for the Rakuten site family
//!
//! Covers Rakuten Ichiba item pages, Rakuten Books pages and the mall
//! search results.

use anyhow::Result;
use async_trait::async_trait;
use scraper::Html;
use tracing::{debug, info};
use url::Url;

use crate::application::scraper::{ScrapeError, Scraper};
use crate::domain::Product;
use crate::infrastructure::config::{ScrapingConfig, rakuten};
use crate::infrastructure::crawler::{Crawler, CrawlerConfig, FetchedPage};
use crate::infrastructure::http_client::{HttpClient, HttpClientConfig};
use crate::infrastructure::parsing::{
    ContextualParser, DetailParseContext, ParsingResult, ProductAssembler, ProductDetailParser,
    SearchParseContext, SearchResultParser,
};

pub struct RakutenScraper {
    crawler: Crawler,
    detail_parser: ProductDetailParser,
    search_parser: SearchResultParser,
    search_base_url: String,
}

impl RakutenScraper {
    /// Scraper with the default Rakuten crawl settings
    pub fn new() -> Result<Self> {
        Self::with_config(&ScrapingConfig::default(), rakuten::SEARCH_BASE_URL)
    }

    /// Scraper with custom crawl settings and search endpoint
    pub fn with_config(scraping: &ScrapingConfig, search_base_url: &str) -> Result<Self> {
        let client = HttpClient::new(HttpClientConfig::from(scraping))?;
        let crawler = Crawler::new(client, CrawlerConfig::from(scraping))?;
        Ok(Self::with_crawler(crawler, search_base_url)?)
    }

    /// Scraper over an already configured crawler
    pub fn with_crawler(crawler: Crawler, search_base_url: &str) -> ParsingResult<Self> {
        Ok(Self {
            crawler,
            detail_parser: ProductDetailParser::new()?,
            search_parser: SearchResultParser::new()?,
            search_base_url: search_base_url.to_string(),
        })
    }

    /// Search page URL with the keyword as an encoded path segment
    pub fn search_url(&self, keyword: &str) -> Result<String, ScrapeError> {
        let invalid = |reason: String| ScrapeError::InvalidSearchUrl {
            keyword: keyword.to_string(),
            reason,
        };

        let mut url = Url::parse(&self.search_base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("base URL cannot have a path".to_string()))?
            .pop_if_empty()
            .push(keyword)
            .push("");
        Ok(url.into())
    }

    /// Fold every fetched page into one product
    fn assemble_product(&self, url: &str, pages: &[FetchedPage]) -> Result<Product, ScrapeError> {
        let mut assembler = ProductAssembler::new(url, rakuten::SITE_KEY, rakuten::CURRENCY);
        for page in pages {
            let html = Html::parse_document(&page.body);
            let fragments = self
                .detail_parser
                .parse_with_context(&html, &DetailParseContext::new(&page.url))?;
            if fragments.is_empty() {
                debug!("No product fields on {}", page.url);
            }
            assembler.absorb(fragments);
        }
        Ok(assembler.finish()?)
    }

    /// Collect listing cards across pages until `max_results` are accepted
    fn collect_search_results(&self, pages: &[FetchedPage], max_results: usize) -> Result<Vec<Product>, ScrapeError> {
        let mut products = Vec::new();
        for page in pages {
            let remaining = max_results.saturating_sub(products.len());
            if remaining == 0 {
                break;
            }
            let html = Html::parse_document(&page.body);
            let context = SearchParseContext::new(&page.url, remaining);
            products.extend(self.search_parser.parse_with_context(&html, &context)?);
        }
        Ok(products)
    }
}

#[async_trait]
impl Scraper for RakutenScraper {
    async fn scrape_product(&self, url: &str) -> Result<Product, ScrapeError> {
        let pages = self.crawler.visit(url).await;
        let product = self.assemble_product(url, &pages)?;

        info!(
            "Scraped product {} '{}' at {:.2} {}",
            product.id,
            product.name,
            product.current_price(),
            product.currency()
        );
        Ok(product)
    }

    async fn scrape_search(&self, keyword: &str, max_results: usize) -> Result<Vec<Product>, ScrapeError> {
        let search_url = self.search_url(keyword)?;
        let pages = self.crawler.visit(&search_url).await;
        let products = self.collect_search_results(&pages, max_results)?;

        info!(
            "Search '{}' returned {} products (max {})",
            keyword,
            products.len(),
            max_results
        );
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_encodes_keyword() {
        let scraper = RakutenScraper::new().unwrap();

        assert_eq!(
            scraper.search_url("tea").unwrap(),
            "https://search.rakuten.co.jp/search/mall/tea/"
        );
        assert_eq!(
            scraper.search_url("nintendo switch").unwrap(),
            "https://search.rakuten.co.jp/search/mall/nintendo%20switch/"
        );
        assert_eq!(
            scraper.search_url("a/b").unwrap(),
            "https://search.rakuten.co.jp/search/mall/a%2Fb/"
        );
    }

    #[test]
    fn test_search_url_rejects_unusable_base() {
        let scraper = RakutenScraper::with_config(&ScrapingConfig::default(), "mailto:x@example.com").unwrap();
        assert!(matches!(
            scraper.search_url("tea"),
            Err(ScrapeError::InvalidSearchUrl { .. })
        ));
    }

    #[test]
    fn test_pages_fold_into_one_product() {
        let scraper = RakutenScraper::new().unwrap();
        let url = "https://item.rakuten.co.jp/teashop/10001/";
        let pages = vec![
            FetchedPage {
                url: url.to_string(),
                depth: 1,
                body: r#"<h1 class="item-name">Sencha</h1><span class="price">1,080円</span>"#.to_string(),
            },
            FetchedPage {
                url: "https://item.rakuten.co.jp/teashop/10001/detail".to_string(),
                depth: 2,
                body: r#"<div class="item-info">Loose leaf</div>"#.to_string(),
            },
        ];

        let product = scraper.assemble_product(url, &pages).unwrap();
        assert_eq!(product.id, "10001");
        assert_eq!(product.description, "Loose leaf");
        assert_eq!(product.price_history().len(), 2);
    }

    #[test]
    fn test_no_pages_is_extraction_failure() {
        let scraper = RakutenScraper::new().unwrap();
        assert!(matches!(
            scraper.assemble_product("https://item.rakuten.co.jp/x/1/", &[]),
            Err(ScrapeError::Extraction(_))
        ));
    }
}
