//! Parsing error types for HTML extraction
//!
//! Selector fallbacks never fail on their own: a missing field is simply
//! left empty. The errors here cover broken configuration and the one
//! extraction outcome callers must see, a product page that yielded no
//! product at all.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("No valid selectors for '{field}' (tried {attempted})")]
    NoValidSelectors { field: String, attempted: usize },

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolutionFailed {
        url: String,
        reason: String,
        base_url: Option<String>,
    },

    #[error("failed to extract product from {url}")]
    ExtractionFailed { url: String },
}

impl ParsingError {
    /// Create an invalid selector error
    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a URL resolution error with the base it was resolved against
    pub fn url_resolution_failed(url: &str, reason: impl ToString, base_url: Option<&str>) -> Self {
        Self::UrlResolutionFailed {
            url: url.to_string(),
            reason: reason.to_string(),
            base_url: base_url.map(str::to_string),
        }
    }

    /// Create an extraction failure for a product page
    pub fn extraction_failed(url: &str) -> Self {
        Self::ExtractionFailed {
            url: url.to_string(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_failed_message_names_url() {
        let error = ParsingError::extraction_failed("https://item.rakuten.co.jp/shop/x/");
        assert_eq!(
            error.to_string(),
            "failed to extract product from https://item.rakuten.co.jp/shop/x/"
        );
    }

    #[test]
    fn test_url_resolution_keeps_base() {
        let error = ParsingError::url_resolution_failed("::", "relative URL without a base", None);
        match error {
            ParsingError::UrlResolutionFailed { base_url, .. } => assert!(base_url.is_none()),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
