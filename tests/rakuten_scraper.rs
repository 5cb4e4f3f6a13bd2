//! Rakuten scraper against a local mock marketplace
#![allow(clippy::float_cmp)]

use price_tracker::application::{RakutenScraper, ScrapeError, Scraper};
use price_tracker::infrastructure::ScrapingConfig;
use price_tracker::infrastructure::parsing::ParsingError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ITEM_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta property="og:image" content="https://thumbnail.image.rakuten.co.jp/sencha.jpg">
</head>
<body>
  <h1 itemprop="name">Shizuoka Sencha 100g</h1>
  <div id="priceCalculationConfig" data-price="1620"></div>
  <div class="item-description">
    First flush tea,
    picked in May.
  </div>
</body>
</html>"#;

fn local_scraping() -> ScrapingConfig {
    ScrapingConfig {
        allowed_domains: vec!["127.0.0.1".to_string()],
        request_delay_ms: 0,
        ..ScrapingConfig::default()
    }
}

fn scraper(server: &MockServer) -> RakutenScraper {
    RakutenScraper::with_config(&local_scraping(), &format!("{}/search/mall/", server.uri())).unwrap()
}

fn search_page(cards: usize) -> String {
    let cards: String = (1..=cards)
        .map(|i| {
            format!(
                r#"<div class="dui-card searchresultitem">
                    <div class="image"><img src="/img/{i}.jpg"></div>
                    <a class="title" href="https://item.rakuten.co.jp/shop/{i}/">Item {i}</a>
                    <div class="price">{i},980円</div>
                </div>"#
            )
        })
        .collect();
    format!("<html><body>{cards}</body></html>")
}

#[tokio::test]
async fn scrape_product_extracts_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/shop/sencha-100/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ITEM_PAGE))
        .mount(&server)
        .await;

    let url = format!("{}/shop/sencha-100/", server.uri());
    let product = scraper(&server).scrape_product(&url).await.unwrap();

    assert_eq!(product.id, "sencha-100");
    assert_eq!(product.name, "Shizuoka Sencha 100g");
    assert_eq!(product.url, url);
    assert_eq!(product.website, "rakuten");
    assert_eq!(product.current_price(), 1620.0);
    assert_eq!(product.currency(), "JPY");
    assert_eq!(product.price_history().len(), 2);
    assert_eq!(product.image_url, "https://thumbnail.image.rakuten.co.jp/sencha.jpg");
    assert_eq!(product.description, "First flush tea, picked in May.");
}

#[tokio::test]
async fn page_without_name_is_extraction_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<span class="price">1,000円</span>"#),
        )
        .mount(&server)
        .await;

    let url = format!("{}/shop/unknown/", server.uri());
    let error = scraper(&server).scrape_product(&url).await.unwrap_err();

    assert!(matches!(
        error,
        ScrapeError::Extraction(ParsingError::ExtractionFailed { url: failed }) if failed == url
    ));
}

#[tokio::test]
async fn failed_fetch_is_extraction_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let url = format!("{}/shop/broken/", server.uri());
    assert!(matches!(
        scraper(&server).scrape_product(&url).await,
        Err(ScrapeError::Extraction(_))
    ));
}

#[tokio::test]
async fn search_respects_result_cap() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/mall/green%20tea/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(15)))
        .mount(&server)
        .await;

    let products = scraper(&server).scrape_search("green tea", 10).await.unwrap();

    assert_eq!(products.len(), 10);
    assert_eq!(products[0].id, "1");
    assert_eq!(products[0].name, "Item 1");
    assert_eq!(products[0].current_price(), 1980.0);
    assert_eq!(products[0].image_url, "/img/1.jpg");
    assert_eq!(products[9].name, "Item 10");
}

#[tokio::test]
async fn search_with_fewer_cards_returns_all() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/mall/tea/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(3)))
        .mount(&server)
        .await;

    let products = scraper(&server).scrape_search("tea", 10).await.unwrap();
    assert_eq!(products.len(), 3);
}

#[tokio::test]
async fn search_outside_allowed_domains_finds_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(3)))
        .expect(0)
        .mount(&server)
        .await;

    let scraping = ScrapingConfig {
        request_delay_ms: 0,
        ..ScrapingConfig::default()
    };
    let scraper =
        RakutenScraper::with_config(&scraping, &format!("{}/search/mall/", server.uri())).unwrap();

    assert!(scraper.scrape_search("tea", 10).await.unwrap().is_empty());
}
