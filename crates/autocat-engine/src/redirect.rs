//! Legacy product URL resolution.
//!
//! Old storefront links carry either a bare article code or a composite
//! `"{text}--{article}"` slug. Both resolve through a single product lookup
//! to the product's canonical path.

use autocat_source::{Freshness, ProductIndex};
use percent_encoding::percent_decode_str;

use crate::error::EngineError;
use crate::listing::encode_component;

/// Path prefix every canonical product detail page starts with.
pub const PRODUCT_DETAIL_PREFIX: &str = "/item/";

const COMPOSITE_SEPARATOR: &str = "--";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// 301 to this path.
    Permanent(String),
    NotFound,
}

/// A same-site absolute path: one leading `/` followed by something other
/// than a second slash or backslash, which browsers read as another host.
#[must_use]
pub fn is_site_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/') && chars.next().is_some_and(|c| c != '/' && c != '\\')
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Extracts the article code from a composite slug: the text after the
/// last `--`, or the whole value when there is none.
#[must_use]
pub fn composite_identifier(decoded: &str) -> &str {
    decoded
        .rsplit(COMPOSITE_SEPARATOR)
        .next()
        .unwrap_or(decoded)
}

async fn resolve(
    index: &dyn ProductIndex,
    identifier: &str,
    freshness: Freshness,
    accept: fn(&str) -> bool,
) -> Result<RedirectOutcome, EngineError> {
    if identifier.is_empty() {
        return Ok(RedirectOutcome::NotFound);
    }
    let Some(product) = index.product(identifier, freshness).await? else {
        tracing::debug!(identifier, "legacy identifier not found");
        return Ok(RedirectOutcome::NotFound);
    };
    if accept(&product.path) {
        Ok(RedirectOutcome::Permanent(product.path))
    } else {
        tracing::debug!(identifier, path = %product.path, "product path rejected for redirect");
        Ok(RedirectOutcome::NotFound)
    }
}

/// Resolves `/p/{identifier}/...` links by exact article code.
///
/// # Errors
///
/// Lookup failures propagate as [`EngineError::Source`]; misses do not.
pub async fn resolve_by_identifier(
    index: &dyn ProductIndex,
    raw: &str,
    freshness: Freshness,
) -> Result<RedirectOutcome, EngineError> {
    let identifier = decode(raw);
    resolve(index, &identifier, freshness, is_site_path).await
}

/// Resolves `/product/{composite}` links; only product detail paths qualify.
///
/// # Errors
///
/// Lookup failures propagate as [`EngineError::Source`]; misses do not.
pub async fn resolve_composite(
    index: &dyn ProductIndex,
    raw: &str,
    freshness: Freshness,
) -> Result<RedirectOutcome, EngineError> {
    let decoded = decode(raw);
    let identifier = composite_identifier(&decoded);
    resolve(index, identifier, freshness, |path| {
        is_site_path(path) && path.starts_with(PRODUCT_DETAIL_PREFIX)
    })
    .await
}

/// Target of the retired `/category/{slug}` pages.
#[must_use]
pub fn category_redirect(slug: &str) -> String {
    format!("/catalog?pcat={}", encode_component(&slug.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use autocat_core::{ListingQuery, ListingResult, Product};
    use autocat_source::SourceError;

    use super::*;

    #[derive(Default)]
    struct Lookup {
        products: HashMap<String, String>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl Lookup {
        fn with(entries: &[(&str, &str)]) -> Self {
            Self {
                products: entries
                    .iter()
                    .map(|(id, path)| ((*id).to_string(), (*path).to_string()))
                    .collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl ProductIndex for Lookup {
        async fn products_with_meta(
            &self,
            _query: &ListingQuery,
            _freshness: Freshness,
        ) -> Result<ListingResult, SourceError> {
            Ok(ListingResult::default())
        }

        async fn product(
            &self,
            identifier: &str,
            _freshness: Freshness,
        ) -> Result<Option<Product>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SourceError::UnexpectedStatus {
                    status: 502,
                    url: format!("/products/{identifier}"),
                });
            }
            Ok(self.products.get(identifier).map(|path| Product {
                article: identifier.to_string(),
                path: path.clone(),
                ..Product::default()
            }))
        }
    }

    const F: Freshness = Freshness::LISTING;

    #[tokio::test]
    async fn composite_resolves_like_bare_identifier() {
        let index = Lookup::with(&[("ART123", "/item/blue-spoiler")]);
        let bare = resolve_composite(&index, "ART123", F).await.unwrap();
        let composite = resolve_composite(&index, "blue-spoiler--ART123", F)
            .await
            .unwrap();
        assert_eq!(bare, composite);
        assert_eq!(bare, RedirectOutcome::Permanent("/item/blue-spoiler".to_string()));
    }

    #[tokio::test]
    async fn composite_takes_last_segment() {
        let index = Lookup::with(&[("ART9", "/item/x")]);
        let outcome = resolve_composite(&index, "a--b--ART9", F).await.unwrap();
        assert_eq!(outcome, RedirectOutcome::Permanent("/item/x".to_string()));
    }

    #[tokio::test]
    async fn composite_rejects_non_detail_paths() {
        let index = Lookup::with(&[("ART1", "/catalog/bmw"), ("ART2", "")]);
        assert_eq!(
            resolve_composite(&index, "ART1", F).await.unwrap(),
            RedirectOutcome::NotFound
        );
        assert_eq!(
            resolve_composite(&index, "ART2", F).await.unwrap(),
            RedirectOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn empty_identifier_skips_lookup() {
        let index = Lookup::default();
        assert_eq!(
            resolve_composite(&index, "spoiler--", F).await.unwrap(),
            RedirectOutcome::NotFound
        );
        assert_eq!(
            resolve_by_identifier(&index, "", F).await.unwrap(),
            RedirectOutcome::NotFound
        );
        assert_eq!(index.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn identifier_is_percent_decoded() {
        let index = Lookup::with(&[("ART 1/2", "/item/odd")]);
        assert_eq!(
            resolve_by_identifier(&index, "ART%201%2F2", F).await.unwrap(),
            RedirectOutcome::Permanent("/item/odd".to_string())
        );
    }

    #[tokio::test]
    async fn identifier_accepts_any_absolute_path() {
        let index = Lookup::with(&[("A", "/legacy/page"), ("B", "item/relative"), ("C", "")]);
        assert_eq!(
            resolve_by_identifier(&index, "A", F).await.unwrap(),
            RedirectOutcome::Permanent("/legacy/page".to_string())
        );
        assert_eq!(
            resolve_by_identifier(&index, "B", F).await.unwrap(),
            RedirectOutcome::NotFound
        );
        assert_eq!(
            resolve_by_identifier(&index, "C", F).await.unwrap(),
            RedirectOutcome::NotFound
        );
        assert_eq!(
            resolve_by_identifier(&index, "missing", F).await.unwrap(),
            RedirectOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn identifier_never_redirects_off_site() {
        let index = Lookup::with(&[
            ("ART1", "//evil.example/phish"),
            ("ART2", "/\\evil.example"),
            ("ART3", "/"),
        ]);
        for id in ["ART1", "ART2", "ART3"] {
            assert_eq!(
                resolve_by_identifier(&index, id, F).await.unwrap(),
                RedirectOutcome::NotFound,
                "{id}"
            );
        }
    }

    #[tokio::test]
    async fn encoded_percent_is_decoded_once() {
        let index = Lookup::with(&[("ART 2", "/item/art-2"), ("ART%202", "/item/literal")]);
        assert_eq!(
            resolve_by_identifier(&index, "ART%25202", F).await.unwrap(),
            RedirectOutcome::Permanent("/item/literal".to_string())
        );
    }

    #[test]
    fn site_paths() {
        assert!(is_site_path("/item/x"));
        assert!(is_site_path("/a"));
        assert!(!is_site_path("/"));
        assert!(!is_site_path("//host/x"));
        assert!(!is_site_path("/\\host"));
        assert!(!is_site_path("https://host/x"));
        assert!(!is_site_path(""));
    }

    #[tokio::test]
    async fn lookup_failure_is_an_error_not_a_miss() {
        let index = Lookup {
            fail: true,
            ..Lookup::default()
        };
        let err = resolve_by_identifier(&index, "ART1", F).await.unwrap_err();
        assert!(matches!(err, EngineError::Source(_)));
    }

    #[test]
    fn category_redirect_lowercases_and_encodes() {
        assert_eq!(category_redirect("Body Kits"), "/catalog?pcat=body%20kits");
        assert_eq!(category_redirect("spoilers"), "/catalog?pcat=spoilers");
    }
}
