//! Collaborator contracts consumed by the catalog engine.
//!
//! Both traits are pure data-shape boundaries: implementations fetch and
//! deserialize, they never reconcile or resolve anything.

use async_trait::async_trait;
use autocat_core::{ListingQuery, ListingResult, Product, ProductCategory, TaxonomyNode};

use crate::error::SourceError;
use crate::freshness::Freshness;

/// Brand/model pair used to look up category hints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelKey {
    pub brand: String,
    pub model: String,
}

impl ModelKey {
    #[must_use]
    pub fn new(brand: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
        }
    }
}

/// Curated taxonomy provider: brand tree, flat categories, model hints.
#[async_trait]
pub trait TaxonomySource: Send + Sync {
    /// Brand nodes with their model children.
    async fn car_categories(&self, freshness: Freshness)
        -> Result<Vec<TaxonomyNode>, SourceError>;

    /// Flat product category list.
    async fn product_categories(
        &self,
        freshness: Freshness,
    ) -> Result<Vec<ProductCategory>, SourceError>;

    /// Popular category names for one brand/model. Best-effort: callers must
    /// tolerate failure.
    async fn model_categories(
        &self,
        key: &ModelKey,
        freshness: Freshness,
    ) -> Result<Vec<String>, SourceError>;
}

/// Opaque paginated product lookup service.
#[async_trait]
pub trait ProductIndex: Send + Sync {
    /// One page of products plus the total count for the filter.
    async fn products_with_meta(
        &self,
        query: &ListingQuery,
        freshness: Freshness,
    ) -> Result<ListingResult, SourceError>;

    /// One page of products without the count.
    async fn products(
        &self,
        query: &ListingQuery,
        freshness: Freshness,
    ) -> Result<Vec<Product>, SourceError> {
        Ok(self.products_with_meta(query, freshness).await?.items)
    }

    /// Single lookup by canonical identifier; `Ok(None)` when absent.
    async fn product(
        &self,
        identifier: &str,
        freshness: Freshness,
    ) -> Result<Option<Product>, SourceError>;
}
