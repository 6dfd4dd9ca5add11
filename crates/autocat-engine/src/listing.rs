//! Pagination window, product-index query composition and infinite-scroll
//! continuation state.

use autocat_core::{ListingQuery, ListingResult};
use autocat_source::{Freshness, ProductIndex};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::EngineError;

pub const ALLOWED_PER_PAGE: [u32; 3] = [12, 24, 30];
pub const DEFAULT_PER_PAGE: u32 = 24;

/// Characters left untouched by `application/x-www-form-urlencoded`.
const FORM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

/// Characters left untouched when encoding a single URI component.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub(crate) fn form_encode(value: &str) -> String {
    utf8_percent_encode(value, FORM)
        .to_string()
        .replace("%20", "+")
}

pub(crate) fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Page number from a raw query value; 1 when absent, malformed or below 1.
#[must_use]
pub fn normalize_page(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

/// Page size from a raw query value; anything outside
/// [`ALLOWED_PER_PAGE`] becomes [`DEFAULT_PER_PAGE`].
#[must_use]
pub fn normalize_per_page(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|per_page| ALLOWED_PER_PAGE.contains(per_page))
        .unwrap_or(DEFAULT_PER_PAGE)
}

#[must_use]
pub fn compute_offset(page: u32, per_page: u32) -> u32 {
    page.saturating_sub(1).saturating_mul(per_page)
}

/// Active listing filters, all lowercased slugs; empty means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingFilters {
    #[serde(rename = "pcat")]
    pub category: String,
    pub brand: String,
    pub model: String,
    pub gen: String,
}

impl ListingFilters {
    /// Builds filters from raw query or path values.
    #[must_use]
    pub fn from_raw(
        category: Option<&str>,
        brand: Option<&str>,
        model: Option<&str>,
        gen: Option<&str>,
    ) -> Self {
        let clean = |v: Option<&str>| v.map(|s| s.trim().to_lowercase()).unwrap_or_default();
        Self {
            category: clean(category),
            brand: clean(brand),
            model: clean(model),
            gen: clean(gen),
        }
    }

    /// The product-index query for one page. `gen` narrows nothing upstream.
    #[must_use]
    pub fn to_query(&self, limit: u32, offset: u32) -> ListingQuery {
        let opt = |v: &str| Some(v.to_string()).filter(|s| !s.is_empty());
        ListingQuery {
            brand: opt(&self.brand),
            model: opt(&self.model),
            category: opt(&self.category),
            limit,
            offset,
        }
    }

    /// Non-empty filters in fixed `pcat, brand, model, gen` order.
    fn pairs(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        [
            ("pcat", self.category.as_str()),
            ("brand", self.brand.as_str()),
            ("model", self.model.as_str()),
            ("gen", self.gen.as_str()),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
    }
}

/// Fetches one page of products for `filters`.
///
/// # Errors
///
/// Propagates [`EngineError::Source`] from the product index.
pub async fn query(
    index: &dyn ProductIndex,
    filters: &ListingFilters,
    limit: u32,
    offset: u32,
    freshness: Freshness,
) -> Result<ListingResult, EngineError> {
    let query = filters.to_query(limit, offset);
    Ok(index.products_with_meta(&query, freshness).await?)
}

/// Whether products remain past the current page.
#[must_use]
pub fn has_more(result: &ListingResult, offset: u32) -> bool {
    let shown = u64::try_from(result.items.len()).unwrap_or(u64::MAX);
    u64::from(offset).saturating_add(shown) < result.total
}

/// Link to the following page, or `None` on the last page.
///
/// `filters` holds only the values that belong in the query string; path
/// segments are already part of `base_path`.
#[must_use]
pub fn build_next_href(
    base_path: &str,
    filters: &ListingFilters,
    per_page: u32,
    page: u32,
    has_more: bool,
) -> Option<String> {
    if !has_more {
        return None;
    }
    let per_page = per_page.to_string();
    let next_page = page.saturating_add(1).to_string();
    let query = filters
        .pairs()
        .chain([("perPage", per_page.as_str()), ("page", next_page.as_str())])
        .map(|(k, v)| format!("{k}={}", form_encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    Some(format!("{base_path}?{query}"))
}

#[derive(Serialize)]
struct ResetKeyInput<'a> {
    filters: &'a ListingFilters,
    #[serde(rename = "perPage")]
    per_page: u32,
    page: u32,
}

/// Opaque key that changes whenever any listing input changes, used by
/// clients to reset accumulated infinite-scroll state.
#[must_use]
pub fn reset_key(filters: &ListingFilters, per_page: u32, page: u32) -> String {
    let input = ResetKeyInput {
        filters,
        per_page,
        page,
    };
    // Serializing plain strings and integers cannot fail.
    let canonical = serde_json::to_string(&input).unwrap_or_default();
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

#[cfg(test)]
#[path = "listing_test.rs"]
mod tests;
