//! Search result parser
//!
//! Turns the listing cards of a search results page into products. Cards
//! are read through the same fallback chains as detail pages; a card is
//! accepted only when both a name and a product URL were found.

use super::config::SearchResultSelectors;
use super::context::SearchParseContext;
use super::price::normalize_price;
use super::{
    ContextualParser, ParsingError, ParsingResult, collapsed_text, compile_selector, compile_selectors,
    first_attr, first_text_in, trimmed_text,
};
use crate::domain::{Product, derive_product_id};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

/// Parser for extracting products from search result pages
pub struct SearchResultParser {
    card_selectors: Vec<Selector>,
    name_selectors: Vec<Selector>,
    price_selectors: Vec<Selector>,
    price_attribute: String,
    link_selectors: Vec<Selector>,
    any_link_selector: Selector,
    url_attribute: String,
    image_selectors: Vec<Selector>,
}

impl SearchResultParser {
    /// Create a new search result parser with default selectors
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&SearchResultSelectors::default())
    }

    /// Create parser with custom selector configuration
    pub fn with_config(selectors: &SearchResultSelectors) -> ParsingResult<Self> {
        Ok(Self {
            card_selectors: compile_selectors("card", &selectors.card)?,
            name_selectors: compile_selectors("card name", &selectors.name)?,
            price_selectors: compile_selectors("card price", &selectors.price)?,
            price_attribute: selectors.price_attribute.clone(),
            link_selectors: compile_selectors("card link", &selectors.link)?,
            any_link_selector: compile_selector(&selectors.any_link)?,
            url_attribute: selectors.url_attribute.clone(),
            image_selectors: compile_selectors("card image", &selectors.image)?,
        })
    }

    /// Extract one card, `None` when its name or URL is missing
    fn extract_card(&self, card: &ElementRef<'_>, context: &SearchParseContext) -> Option<Product> {
        let name = self
            .name_selectors
            .iter()
            .find_map(|selector| first_text_in(card, selector, trimmed_text))?;
        let url = self.extract_url(card, &context.page_url)?;

        let mut price = self
            .price_selectors
            .iter()
            .find_map(|selector| first_text_in(card, selector, collapsed_text))
            .map_or(0.0, |text| normalize_price(&text));
        if price <= 0.0 {
            if let Some(attr) = card.value().attr(&self.price_attribute) {
                price = normalize_price(attr);
            }
        }

        let image_url = self
            .image_selectors
            .iter()
            .find_map(|selector| {
                card.select(selector)
                    .find_map(|img| first_attr(&img, &["src".to_string()]))
            })
            .unwrap_or_default();

        let id = derive_product_id(&url, &context.website);
        debug!("Found product: {}, URL: {}, Price: {:.2}", name, url, price);

        let mut product = Product::new(id, name, url, context.website.clone(), price, &context.currency);
        product.image_url = image_url;
        Some(product)
    }

    /// Preferred links, then any link, then the card's URL attribute
    fn extract_url(&self, card: &ElementRef<'_>, page_url: &str) -> Option<String> {
        let href = |element: ElementRef<'_>| {
            element
                .value()
                .attr("href")
                .map(str::trim)
                .filter(|href| !href.is_empty())
                .map(str::to_string)
        };

        let raw = self
            .link_selectors
            .iter()
            .find_map(|selector| card.select(selector).find_map(href))
            .or_else(|| card.select(&self.any_link_selector).find_map(href))
            .or_else(|| first_attr(card, std::slice::from_ref(&self.url_attribute)))?;

        match resolve_url(&raw, page_url) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!("Skipping card link: {}", e);
                None
            }
        }
    }
}

/// Resolve a possibly relative link against the page it was found on
pub fn resolve_url(href: &str, base_url: &str) -> ParsingResult<String> {
    let base = Url::parse(base_url)
        .map_err(|e| ParsingError::url_resolution_failed(href, e, Some(base_url)))?;
    base.join(href)
        .map(String::from)
        .map_err(|e| ParsingError::url_resolution_failed(href, e, Some(base_url)))
}

impl ContextualParser for SearchResultParser {
    type Output = Vec<Product>;
    type Context = SearchParseContext;

    /// Accept up to `context.limit` cards from the first card selector that
    /// matches anything on the page
    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output> {
        debug!("Parsing search results from: {}", context.page_url);

        let mut products = Vec::new();
        if context.limit == 0 {
            return Ok(products);
        }

        for (i, selector) in self.card_selectors.iter().enumerate() {
            let cards: Vec<ElementRef<'_>> = html.select(selector).collect();
            if cards.is_empty() {
                continue;
            }
            debug!("Found {} cards using selector #{}", cards.len(), i);

            for (index, card) in cards.iter().enumerate() {
                if products.len() >= context.limit {
                    debug!(
                        "Result cap {} reached, skipping {} remaining cards",
                        context.limit,
                        cards.len() - index
                    );
                    break;
                }
                match self.extract_card(card, context) {
                    Some(product) => products.push(product),
                    None => debug!("Skipping card {}: missing name or URL", index),
                }
            }
            break;
        }

        Ok(products)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://search.rakuten.co.jp/search/mall/tea/";

    fn card(id: u32) -> String {
        format!(
            r#"<div class="searchresultitem">
                <div class="image"><img src="https://thumbnail.image.rakuten.co.jp/{id}.jpg"></div>
                <h2><a class="title" href="https://item.rakuten.co.jp/teashop/{id}/">Tea {id}</a></h2>
                <span class="important">{id},000円</span>
            </div>"#
        )
    }

    fn parse(body: &str, limit: usize) -> Vec<Product> {
        let parser = SearchResultParser::new().unwrap();
        let html = Html::parse_document(body);
        parser
            .parse_with_context(&html, &SearchParseContext::new(PAGE_URL, limit))
            .unwrap()
    }

    #[test]
    fn test_extracts_cards() {
        let products = parse(&format!("<body>{}{}</body>", card(1), card(2)), 10);

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].id, "1");
        assert_eq!(products[0].name, "Tea 1");
        assert_eq!(products[0].url, "https://item.rakuten.co.jp/teashop/1/");
        assert_eq!(products[0].current_price(), 1000.0);
        assert_eq!(products[0].image_url, "https://thumbnail.image.rakuten.co.jp/1.jpg");
        assert_eq!(products[1].website, "rakuten");
        assert_eq!(products[1].currency(), "JPY");
    }

    #[test]
    fn test_result_cap() {
        let body: String = (1..=15).map(card).collect();
        let products = parse(&format!("<body>{body}</body>"), 10);
        assert_eq!(products.len(), 10);
        assert_eq!(products[9].name, "Tea 10");

        assert!(parse(&format!("<body>{body}</body>"), 0).is_empty());
    }

    #[test]
    fn test_card_without_url_or_name_is_rejected() {
        let body = r#"<body>
            <div class="searchresultitem"><span class="title">No link</span></div>
            <div class="searchresultitem"><a href="/shop/1/"></a></div>
        </body>"#;
        assert!(parse(body, 10).is_empty());
    }

    #[test]
    fn test_relative_and_data_url_links() {
        let body = r#"<body>
            <div class="g-category-item" data-price="3,200">
                <span class="g-category-item-name">Relative</span>
                <a href="/shop/55/">view</a>
            </div>
            <div class="g-category-item" data-url="https://books.rakuten.co.jp/rb/99999/">
                <span class="g-category-item-name">Book</span>
                <span class="g-category-item-price">1,650円</span>
            </div>
        </body>"#;
        let products = parse(body, 10);

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].url, "https://search.rakuten.co.jp/shop/55/");
        assert_eq!(products[0].id, "55");
        assert_eq!(products[0].current_price(), 3200.0);
        assert_eq!(products[1].id, "99999");
        assert_eq!(products[1].current_price(), 1650.0);
        assert!(products[1].image_url.is_empty());
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url("/a/b/", PAGE_URL).unwrap(),
            "https://search.rakuten.co.jp/a/b/"
        );
        assert!(resolve_url("/a", "not a url").is_err());
    }
}
