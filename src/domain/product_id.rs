//! Product identifier derivation from marketplace URLs
//!
//! Recognized shapes produce a deterministic id; everything else gets a
//! generated id that is unique within the process but not reproducible.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use url::Url;

/// Last timestamp handed out by [`fallback_id`], keeps generated ids monotonic
static LAST_FALLBACK_NANOS: AtomicI64 = AtomicI64::new(0);

/// Derive a product id from its URL, falling back to a generated one
///
/// - `https://item.rakuten.co.jp/<store>/<id>/` → `<id>`
/// - `https://books.rakuten.co.jp/rb/<id>` → `<id>`
/// - anything else → `"<site>-<nanos>"`
pub fn derive_product_id(url: &str, site: &str) -> String {
    id_from_url(url).unwrap_or_else(|| fallback_id(site))
}

/// Deterministic part of the derivation, `None` for unrecognized shapes
pub fn id_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let path = parsed.path();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if path.ends_with('/') && segments.len() >= 2 {
        return segments.last().map(|s| (*s).to_string());
    }

    segments
        .windows(2)
        .find(|pair| pair[0] == "rb")
        .map(|pair| pair[1].to_string())
}

fn fallback_id(site: &str) -> String {
    let now = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let mut last = LAST_FALLBACK_NANOS.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_FALLBACK_NANOS.compare_exchange_weak(
            last,
            next,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return format!("{site}-{next}"),
            Err(current) => last = current,
        }
    }
}
