//! Parsing configuration for HTML extraction
//!
//! Centralized selector fallback chains. Each list is tried in order and the
//! first rule yielding non-empty data wins. Defaults target the Rakuten
//! Ichiba and Rakuten Books page layouts.

use serde::{Deserialize, Serialize};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Main parsing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsingConfig {
    /// Product detail selectors
    pub product_detail_selectors: ProductDetailSelectors,

    /// Search result selectors
    pub search_result_selectors: SearchResultSelectors,
}

/// CSS selectors for product detail pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetailSelectors {
    /// Product name; the only field whose match creates a product
    pub name: Vec<String>,

    /// Price containers
    pub price_container: Vec<String>,

    /// Price text inside a container, tried before the container's own text
    pub price_nested: Vec<String>,

    /// Container attribute consulted when no text was found
    pub price_attribute: String,

    /// Image elements
    pub image: Vec<String>,

    /// Image attributes in precedence order
    pub image_attributes: Vec<String>,

    /// Description blocks, read as whole subtrees
    pub description: Vec<String>,
}

impl Default for ProductDetailSelectors {
    fn default() -> Self {
        Self {
            name: strings(&[
                "h1.item-name",
                "h1#item-name",
                "h1[itemprop='name']",
                "span.item-name",
                "h1.booksTitle",
            ]),
            price_container: strings(&[
                ".price-box",
                "#priceCalculationConfig",
                "span[itemprop='price']",
                ".price",
                ".itemPrice",
                "#priceAmount",
            ]),
            price_nested: strings(&[".price", ".price-value"]),
            price_attribute: "data-price".to_string(),
            image: strings(&[
                "meta[property='og:image']",
                "img.rakuten-main-product-image",
                "img#imageURL",
            ]),
            image_attributes: strings(&["content", "src", "href"]),
            description: strings(&[
                "#item-description",
                ".item-description",
                ".item-details",
                ".item-info",
                "[itemprop='description']",
                "#itemCaption",
            ]),
        }
    }
}

/// CSS selectors for search result pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultSelectors {
    /// Listing card containers; the first selector matching any card wins
    pub card: Vec<String>,

    /// Product name inside a card
    pub name: Vec<String>,

    /// Price text inside a card
    pub price: Vec<String>,

    /// Card attribute holding the price when the text yields nothing
    pub price_attribute: String,

    /// Preferred product links inside a card
    pub link: Vec<String>,

    /// Generic link used when no preferred link carries an href
    pub any_link: String,

    /// Card attribute holding the product URL as a last resort
    pub url_attribute: String,

    /// Product image inside a card
    pub image: Vec<String>,
}

impl Default for SearchResultSelectors {
    fn default() -> Self {
        Self {
            card: strings(&[
                "div.searchresultitem",
                "div.dui-card.searchresultitem",
                ".g-category-item",
            ]),
            name: strings(&[".title", ".g-category-item-name"]),
            price: strings(&[".important", ".price", ".g-category-item-price"]),
            price_attribute: "data-price".to_string(),
            link: strings(&["a.title", "a.g-category-item-name", "a[data-url]"]),
            any_link: "a".to_string(),
            url_attribute: "data-url".to_string(),
            image: strings(&[".image img", ".g-category-item-image img"]),
        }
    }
}
