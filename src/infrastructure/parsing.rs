//! HTML parsing infrastructure for marketplace pages
//!
//! Every field is extracted through an ordered selector fallback chain:
//! the first rule that yields non-empty data wins and later rules are not
//! attempted. Parsers are stateless; the mutable product being built across
//! pages lives in [`ProductAssembler`], not in the parser.

pub mod config;
pub mod context;
pub mod error;
pub mod price;
pub mod product_detail_parser;
pub mod search_result_parser;

// Re-export public types
pub use config::{ParsingConfig, ProductDetailSelectors, SearchResultSelectors};
pub use context::{DetailParseContext, SearchParseContext};
pub use error::{ParsingError, ParsingResult};
pub use price::normalize_price;
pub use product_detail_parser::{ProductAssembler, ProductDetailParser, ProductFragments};
pub use search_result_parser::SearchResultParser;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

/// Parser trait with context support
pub trait ContextualParser {
    type Output;
    type Context;

    /// Parse HTML with contextual information
    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output>;
}

/// Compile selector strings into Selector objects
///
/// Invalid selectors are skipped with a warning; a chain where nothing
/// compiles is an error.
pub(crate) fn compile_selectors(field: &str, selector_strings: &[String]) -> ParsingResult<Vec<Selector>> {
    let mut selectors = Vec::with_capacity(selector_strings.len());

    for selector_str in selector_strings {
        match Selector::parse(selector_str) {
            Ok(selector) => selectors.push(selector),
            Err(e) => warn!("Failed to compile {} selector '{}': {}", field, selector_str, e),
        }
    }

    if selectors.is_empty() && !selector_strings.is_empty() {
        return Err(ParsingError::NoValidSelectors {
            field: field.to_string(),
            attempted: selector_strings.len(),
        });
    }

    Ok(selectors)
}

/// Compile a single selector, failing on invalid syntax
pub(crate) fn compile_selector(selector_str: &str) -> ParsingResult<Selector> {
    Selector::parse(selector_str).map_err(|e| ParsingError::invalid_selector(selector_str, e))
}

/// Text of an element with whitespace runs collapsed to single spaces
pub(crate) fn collapsed_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Full text of an element with only the ends trimmed
pub(crate) fn trimmed_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// How an element's text is read
pub(crate) type TextReader = fn(&ElementRef<'_>) -> String;

/// First non-empty text among the elements matched by `selector`
pub(crate) fn first_text_in(scope: &ElementRef<'_>, selector: &Selector, read: TextReader) -> Option<String> {
    scope
        .select(selector)
        .map(|element| read(&element))
        .find(|text| !text.is_empty())
}

/// Run a text fallback chain over a whole document
pub(crate) fn text_with_fallbacks(
    html: &Html,
    field: &str,
    selectors: &[Selector],
    read: TextReader,
) -> Option<String> {
    for (i, selector) in selectors.iter().enumerate() {
        if let Some(text) = first_text_in(&html.root_element(), selector, read) {
            debug!("{} matched by selector #{}", field, i);
            return Some(text);
        }
    }
    debug!("{} not found after {} selectors", field, selectors.len());
    None
}

/// First non-empty attribute among `attributes`, in precedence order
pub(crate) fn first_attr(element: &ElementRef<'_>, attributes: &[String]) -> Option<String> {
    attributes
        .iter()
        .filter_map(|name| element.value().attr(name))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
