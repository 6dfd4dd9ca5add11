//! Robots directives, canonical URL and page titles.
//!
//! A page is indexable only in its unfiltered, first-page, default-size form,
//! when its taxonomy node allows it and there is something to show.

use autocat_core::TaxonomyNode;
use serde::Serialize;

use crate::listing::DEFAULT_PER_PAGE;

pub const CATALOG_TITLE: &str = "Car tuning parts catalog";
pub const CATALOG_DESCRIPTION: &str =
    "Find car parts by brand, model and category. Current products and filters.";

/// URL depth of a listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLevel {
    Catalog,
    Brand,
    Model,
}

/// Raw, unvalidated listing query parameters as received.
#[derive(Debug, Clone, Default)]
pub struct RawListingParams<'a> {
    pub pcat: Option<&'a str>,
    pub brand: Option<&'a str>,
    pub model: Option<&'a str>,
    pub gen: Option<&'a str>,
    pub page: Option<&'a str>,
    pub per_page: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeoInput {
    pub has_active_filters: bool,
    pub indexable: bool,
    pub canonical_url: Option<String>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeoDirectives {
    pub index: bool,
    pub follow: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
}

impl SeoDirectives {
    #[must_use]
    pub fn from_input(input: SeoInput) -> Self {
        let index = !input.has_active_filters && input.indexable && input.total > 0;
        Self {
            index,
            follow: true,
            canonical: input
                .canonical_url
                .filter(|url| index && !url.trim().is_empty()),
        }
    }
}

/// Title, description and robots directives for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub robots: SeoDirectives,
}

fn present(raw: Option<&str>) -> bool {
    raw.is_some_and(|v| !v.trim().is_empty())
}

/// Lenient integer read where absent, malformed and zero all mean "default".
fn raw_number(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|n| *n != 0)
}

/// Whether the request deviates from the canonical form of the page.
///
/// Judged on raw parameters: `perPage=13` is a filter even though the
/// listing itself falls back to the default size.
#[must_use]
pub fn has_active_filters(raw: &RawListingParams<'_>, level: PageLevel) -> bool {
    let page = raw_number(raw.page).unwrap_or(1);
    let per_page = raw_number(raw.per_page).unwrap_or(i64::from(DEFAULT_PER_PAGE));
    let path_filters = level == PageLevel::Catalog
        && (present(raw.brand) || present(raw.model) || present(raw.gen));

    present(raw.pcat) || page > 1 || per_page != i64::from(DEFAULT_PER_PAGE) || path_filters
}

/// Catalog root: fixed copy; canonical is the site's `/catalog`.
#[must_use]
pub fn catalog_meta(has_active_filters: bool, total: u64, site_base_url: Option<&str>) -> PageMeta {
    let canonical = match site_base_url {
        Some(base) if !base.is_empty() => format!("{}/catalog", base.trim_end_matches('/')),
        _ => "/catalog".to_string(),
    };
    PageMeta {
        title: CATALOG_TITLE.to_string(),
        description: CATALOG_DESCRIPTION.to_string(),
        robots: SeoDirectives::from_input(SeoInput {
            has_active_filters,
            indexable: !CATALOG_DESCRIPTION.trim().is_empty(),
            canonical_url: Some(canonical),
            total,
        }),
    }
}

/// Brand page: curated SEO copy when present, else the brand name.
#[must_use]
pub fn brand_meta(
    brand: Option<&TaxonomyNode>,
    brand_name: &str,
    has_active_filters: bool,
    total: u64,
) -> PageMeta {
    let non_blank = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
    PageMeta {
        title: brand
            .and_then(|node| non_blank(&node.seo_title))
            .unwrap_or_else(|| brand_name.to_string()),
        description: brand
            .and_then(|node| non_blank(&node.seo_description))
            .unwrap_or_default(),
        robots: node_directives(brand, has_active_filters, total),
    }
}

/// Model page: `"{model} - {brand}"`.
#[must_use]
pub fn model_meta(
    model: Option<&TaxonomyNode>,
    model_name: &str,
    brand_name: &str,
    has_active_filters: bool,
    total: u64,
) -> PageMeta {
    PageMeta {
        title: format!("{model_name} - {brand_name}"),
        description: String::new(),
        robots: node_directives(model, has_active_filters, total),
    }
}

fn node_directives(node: Option<&TaxonomyNode>, has_active_filters: bool, total: u64) -> SeoDirectives {
    SeoDirectives::from_input(SeoInput {
        has_active_filters,
        indexable: node.is_some_and(|n| n.indexable),
        canonical_url: node.and_then(|n| n.canonical.clone()),
        total,
    })
}
