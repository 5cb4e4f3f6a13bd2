//! Product detail parser
//!
//! Extracts the four layout-dependent fields of a product page through
//! selector fallback chains. Parsing is a pure pass over one document and
//! yields [`ProductFragments`]; [`ProductAssembler`] folds the fragments of
//! every page of a crawl into the single product being built.

use super::config::ProductDetailSelectors;
use super::context::DetailParseContext;
use super::price::normalize_price;
use super::{
    ContextualParser, ParsingError, ParsingResult, collapsed_text, compile_selectors, first_attr,
    first_text_in, text_with_fallbacks, trimmed_text,
};
use crate::domain::{Product, derive_product_id};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Field values found on one page, each possibly absent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFragments {
    pub name: Option<String>,
    /// Normalized price of the first non-empty price text, may be `0.0`
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

impl ProductFragments {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.image_url.is_none()
            && self.description.is_none()
    }
}

/// Parser for extracting product fields from detail pages
pub struct ProductDetailParser {
    name_selectors: Vec<Selector>,
    price_container_selectors: Vec<Selector>,
    price_nested_selectors: Vec<Selector>,
    price_attribute: String,
    image_selectors: Vec<Selector>,
    image_attributes: Vec<String>,
    description_selectors: Vec<Selector>,
}

impl ProductDetailParser {
    /// Create a new product detail parser with default configuration
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ProductDetailSelectors::default())
    }

    /// Create parser with custom selector configuration
    pub fn with_config(selectors: &ProductDetailSelectors) -> ParsingResult<Self> {
        Ok(Self {
            name_selectors: compile_selectors("name", &selectors.name)?,
            price_container_selectors: compile_selectors("price", &selectors.price_container)?,
            price_nested_selectors: compile_selectors("price text", &selectors.price_nested)?,
            price_attribute: selectors.price_attribute.clone(),
            image_selectors: compile_selectors("image", &selectors.image)?,
            image_attributes: selectors.image_attributes.clone(),
            description_selectors: compile_selectors("description", &selectors.description)?,
        })
    }

    /// Extract all fields of one page in name, price, image, description order
    pub fn extract(&self, html: &Html) -> ProductFragments {
        ProductFragments {
            name: text_with_fallbacks(html, "name", &self.name_selectors, trimmed_text),
            price: self.extract_price(html),
            image_url: self.extract_image(html),
            description: text_with_fallbacks(
                html,
                "description",
                &self.description_selectors,
                collapsed_text,
            ),
        }
    }

    /// First non-empty price text across all containers, normalized
    fn extract_price(&self, html: &Html) -> Option<f64> {
        for (i, selector) in self.price_container_selectors.iter().enumerate() {
            for container in html.select(selector) {
                if let Some(text) = self.price_text(&container) {
                    let price = normalize_price(&text);
                    debug!("price container #{} yielded '{}' -> {}", i, text, price);
                    return Some(price);
                }
            }
        }
        debug!("price not found after {} selectors", self.price_container_selectors.len());
        None
    }

    /// Nested price text, then the container's own text, then its data attribute
    fn price_text(&self, container: &ElementRef<'_>) -> Option<String> {
        self.price_nested_selectors
            .iter()
            .find_map(|nested| first_text_in(container, nested, collapsed_text))
            .or_else(|| Some(collapsed_text(container)).filter(|text| !text.is_empty()))
            .or_else(|| first_attr(container, std::slice::from_ref(&self.price_attribute)))
    }

    fn extract_image(&self, html: &Html) -> Option<String> {
        for (i, selector) in self.image_selectors.iter().enumerate() {
            if let Some(url) = html
                .select(selector)
                .find_map(|element| first_attr(&element, &self.image_attributes))
            {
                debug!("image matched by selector #{}", i);
                return Some(url);
            }
        }
        None
    }
}

impl ContextualParser for ProductDetailParser {
    type Output = ProductFragments;
    type Context = DetailParseContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output> {
        debug!("Parsing product detail from: {}", context.url);
        Ok(self.extract(html))
    }
}

/// Builds one product from the fragments of every page of a crawl
///
/// Only a name creates the product. Fragments that arrive while no product
/// exists are dropped, including prices; a later name does not replace the
/// product already created.
#[derive(Debug)]
pub struct ProductAssembler {
    url: String,
    website: String,
    currency: String,
    product: Option<Product>,
}

impl ProductAssembler {
    pub fn new(url: impl Into<String>, website: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            website: website.into(),
            currency: currency.into(),
            product: None,
        }
    }

    /// Fold one page's fragments into the product
    pub fn absorb(&mut self, fragments: ProductFragments) {
        if let Some(name) = fragments.name {
            if self.product.is_none() {
                let id = derive_product_id(&self.url, &self.website);
                debug!("Creating product '{}' ({}) from {}", name, id, self.url);
                self.product = Some(Product::new(
                    id,
                    name,
                    self.url.clone(),
                    self.website.clone(),
                    0.0,
                    &self.currency,
                ));
            } else {
                debug!("Ignoring additional product name '{}'", name);
            }
        }

        let Some(product) = self.product.as_mut() else {
            if let Some(price) = fragments.price {
                debug!("Dropping price {} seen before any product name", price);
            }
            return;
        };

        if let Some(price) = fragments.price.filter(|price| *price > 0.0) {
            product.update_price(price, &self.currency);
        }
        if let Some(image_url) = fragments.image_url {
            product.image_url = image_url;
        }
        if let Some(description) = fragments.description {
            product.description = description;
        }
    }

    pub fn product(&self) -> Option<&Product> {
        self.product.as_ref()
    }

    /// The assembled product, or an extraction failure when no name was seen
    pub fn finish(self) -> ParsingResult<Product> {
        self.product
            .ok_or_else(|| ParsingError::extraction_failed(&self.url))
    }
}
