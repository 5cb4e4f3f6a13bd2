//! Price text normalization
//!
//! Marketplace prices arrive as display text such as `¥1,234`, `1,980円`
//! or `税込 3,300円`. Normalization never fails: `0.0` means "unknown".

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static DIGIT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("digit run pattern is valid"));

/// Currency glyphs and separators removed before digit extraction
const STRIPPED: &[char] = &['円', '¥', '￥', ','];

/// Convert locale price text to a number, `0.0` when nothing parses
///
/// Only the first run of ASCII digits is used, so decimals and trailing
/// amounts are ignored: `"1,234.56"` becomes `1234.0`.
pub fn normalize_price(text: &str) -> f64 {
    let cleaned: String = text.chars().filter(|c| !STRIPPED.contains(c)).collect();
    let cleaned = cleaned.trim();

    let Some(digits) = DIGIT_RUN.find(cleaned) else {
        if !cleaned.is_empty() {
            debug!("No digits in price text '{}'", cleaned);
        }
        return 0.0;
    };

    match digits.as_str().parse::<f64>() {
        Ok(price) => price,
        Err(e) => {
            debug!(
                "Failed to parse price from text '{}' (extracted '{}'): {}",
                cleaned,
                digits.as_str(),
                e
            );
            0.0
        }
    }
}
