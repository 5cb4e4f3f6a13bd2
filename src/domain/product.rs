use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A price observed at a specific point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: f64,
    pub currency: String,
    pub timestamp: DateTime<Utc>,
}

impl PricePoint {
    fn now(price: f64, currency: &str) -> Self {
        Self {
            price,
            currency: currency.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Marketplace product with its price history
///
/// The pricing fields are private: `current_price` and `currency` always
/// mirror the last entry of `price_history`, which is never empty and only
/// ever grows through [`Product::update_price`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProductRecord")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub url: String,
    pub image_url: String,
    pub description: String,
    price_history: Vec<PricePoint>,
    current_price: f64,
    currency: String,
    last_updated: DateTime<Utc>,
    /// Site key of the scraper that produced this product, e.g. "rakuten"
    pub website: String,
}

impl Product {
    /// Create a product with a single initial price point
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        website: impl Into<String>,
        price: f64,
        currency: &str,
    ) -> Self {
        let point = PricePoint::now(price, currency);
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            image_url: String::new(),
            description: String::new(),
            current_price: price,
            currency: currency.to_string(),
            last_updated: point.timestamp,
            price_history: vec![point],
            website: website.into(),
        }
    }

    /// Record a new price. Always appends to the history, even when the
    /// price did not change.
    pub fn update_price(&mut self, price: f64, currency: &str) {
        let point = PricePoint::now(price, currency);
        self.current_price = price;
        self.currency = currency.to_string();
        self.last_updated = point.timestamp;
        self.price_history.push(point);
    }

    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Chronological price history, oldest first
    pub fn price_history(&self) -> &[PricePoint] {
        &self.price_history
    }
}

/// Raw snapshot shape, validated before it becomes a [`Product`]
#[derive(Debug, Deserialize)]
struct ProductRecord {
    id: String,
    name: String,
    url: String,
    #[serde(default)]
    image_url: String,
    #[serde(default)]
    description: String,
    price_history: Vec<PricePoint>,
    current_price: f64,
    currency: String,
    last_updated: DateTime<Utc>,
    website: String,
}

#[derive(Error, Debug)]
pub enum InvalidProductRecord {
    #[error("product '{id}' has an empty price history")]
    EmptyPriceHistory { id: String },

    #[error("product '{id}' current price {current} {currency} does not match its latest price point")]
    CurrentPriceMismatch {
        id: String,
        current: f64,
        currency: String,
    },
}

impl TryFrom<ProductRecord> for Product {
    type Error = InvalidProductRecord;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        let Some(latest) = record.price_history.last() else {
            return Err(InvalidProductRecord::EmptyPriceHistory { id: record.id });
        };

        #[allow(clippy::float_cmp)]
        let matches_latest =
            latest.price == record.current_price && latest.currency == record.currency;
        if !matches_latest {
            return Err(InvalidProductRecord::CurrentPriceMismatch {
                id: record.id,
                current: record.current_price,
                currency: record.currency,
            });
        }

        Ok(Self {
            id: record.id,
            name: record.name,
            url: record.url,
            image_url: record.image_url,
            description: record.description,
            price_history: record.price_history,
            current_price: record.current_price,
            currency: record.currency,
            last_updated: record.last_updated,
            website: record.website,
        })
    }
}
