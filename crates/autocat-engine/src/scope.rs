//! Per-request read deduplication.
//!
//! [`RequestScope`] wraps the shared sources and implements the same traits,
//! so engine code reads through it transparently. Each distinct read runs at
//! most once per scope; concurrent callers of the same read wait on one
//! in-flight future. Failed reads are not memoized.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use autocat_core::{ListingQuery, ListingResult, Product, ProductCategory, TaxonomyNode};
use autocat_source::{Freshness, ModelKey, ProductIndex, SourceError, TaxonomySource};
use tokio::sync::{Mutex, OnceCell};

/// Keyed set of once-initialised cells.
struct Memo<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Memo<K, V> {
    async fn get_or_try_init<F, Fut>(&self, key: &K, init: F) -> Result<V, SourceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, SourceError>>,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            Arc::clone(cells.entry(key.clone()).or_default())
        };
        cell.get_or_try_init(init).await.cloned()
    }
}

/// Memoizing view over the catalog sources for the lifetime of one request.
pub struct RequestScope {
    taxonomy: Arc<dyn TaxonomySource>,
    index: Arc<dyn ProductIndex>,
    car_categories: OnceCell<Vec<TaxonomyNode>>,
    product_categories: OnceCell<Vec<ProductCategory>>,
    model_categories: Memo<ModelKey, Vec<String>>,
    listings: Memo<ListingQuery, ListingResult>,
    lookups: Memo<String, Option<Product>>,
}

impl RequestScope {
    #[must_use]
    pub fn new(taxonomy: Arc<dyn TaxonomySource>, index: Arc<dyn ProductIndex>) -> Self {
        Self {
            taxonomy,
            index,
            car_categories: OnceCell::new(),
            product_categories: OnceCell::new(),
            model_categories: Memo::default(),
            listings: Memo::default(),
            lookups: Memo::default(),
        }
    }
}

#[async_trait]
impl TaxonomySource for RequestScope {
    async fn car_categories(
        &self,
        freshness: Freshness,
    ) -> Result<Vec<TaxonomyNode>, SourceError> {
        self.car_categories
            .get_or_try_init(|| self.taxonomy.car_categories(freshness))
            .await
            .cloned()
    }

    async fn product_categories(
        &self,
        freshness: Freshness,
    ) -> Result<Vec<ProductCategory>, SourceError> {
        self.product_categories
            .get_or_try_init(|| self.taxonomy.product_categories(freshness))
            .await
            .cloned()
    }

    async fn model_categories(
        &self,
        key: &ModelKey,
        freshness: Freshness,
    ) -> Result<Vec<String>, SourceError> {
        self.model_categories
            .get_or_try_init(key, || self.taxonomy.model_categories(key, freshness))
            .await
    }
}

#[async_trait]
impl ProductIndex for RequestScope {
    async fn products_with_meta(
        &self,
        query: &ListingQuery,
        freshness: Freshness,
    ) -> Result<ListingResult, SourceError> {
        self.listings
            .get_or_try_init(query, || self.index.products_with_meta(query, freshness))
            .await
    }

    async fn product(
        &self,
        identifier: &str,
        freshness: Freshness,
    ) -> Result<Option<Product>, SourceError> {
        self.lookups
            .get_or_try_init(&identifier.to_string(), || {
                self.index.product(identifier, freshness)
            })
            .await
    }
}
