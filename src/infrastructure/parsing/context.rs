//! Parsing context for HTML extraction
//!
//! Provides the per-call information a parser needs besides the document.

use crate::infrastructure::config::rakuten;

/// Detail parsing context for product pages
#[derive(Debug, Clone)]
pub struct DetailParseContext {
    /// URL of the page being parsed
    pub url: String,
}

impl DetailParseContext {
    /// Create new detail parse context
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Context for search result pages
#[derive(Debug, Clone)]
pub struct SearchParseContext {
    /// URL of the results page, used to resolve relative product links
    pub page_url: String,

    /// Site key stamped on every product
    pub website: String,

    /// Currency every listed price is reported in
    pub currency: String,

    /// Cards to accept from this page before skipping the rest
    pub limit: usize,
}

impl SearchParseContext {
    /// Create new search parse context for the Rakuten site family
    pub fn new(page_url: impl Into<String>, limit: usize) -> Self {
        Self {
            page_url: page_url.into(),
            website: rakuten::SITE_KEY.to_string(),
            currency: rakuten::CURRENCY.to_string(),
            limit,
        }
    }
}
