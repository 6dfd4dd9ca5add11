//! HTTP client for the upstream catalog API.
//!
//! Implements both [`TaxonomySource`] and [`ProductIndex`] over plain JSON
//! endpoints. Response bodies go through a [`ResponseCache`] keyed by the full
//! request URL, so two reads with identical parameters within one freshness
//! window share a single upstream round-trip.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use autocat_core::{
    AppConfig, ListingQuery, ListingResult, Product, ProductCategory, TaxonomyNode,
};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::SourceError;
use crate::freshness::{Freshness, ResponseCache};
use crate::retry::RetryPolicy;
use crate::source::{ModelKey, ProductIndex, TaxonomySource};

/// Client for the upstream catalog API.
///
/// Use [`HttpCatalogClient::new`] with an explicit base URL (wiremock in
/// tests) or [`HttpCatalogClient::from_config`] in the server.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: Client,
    base_url: Url,
    cache: ResponseCache,
    retry: RetryPolicy,
}

impl HttpCatalogClient {
    /// Creates a client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`SourceError::InvalidBaseUrl`] if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
        cache: ResponseCache,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: Self::parse_base_url(base_url)?,
            cache,
            retry: RetryPolicy::new(max_retries, backoff_base_ms),
        })
    }

    /// Creates a client from application configuration.
    ///
    /// # Errors
    ///
    /// See [`HttpCatalogClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, SourceError> {
        Self::new(
            &config.api_base_url,
            config.request_timeout_secs,
            &config.user_agent,
            config.max_retries,
            config.retry_backoff_base_ms,
            ResponseCache::bounded(
                config.cache_enabled,
                config.cache_capacity,
                config.taxonomy_freshness().max(config.listing_freshness()),
            ),
        )
    }

    /// Normalises the base so it ends with exactly one slash; endpoint
    /// segments are appended below it rather than replacing its last segment.
    fn parse_base_url(base_url: &str) -> Result<Url, SourceError> {
        let invalid = |reason: String| SourceError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason,
        };
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let url = Url::parse(&normalised).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(invalid("expected an absolute http(s) URL".to_owned()));
        }
        Ok(url)
    }

    fn endpoint(&self, segments: &[&str], params: &[(&str, &str)]) -> String {
        let mut url = self.base_url.clone();
        // parse_base_url rejects cannot-be-a-base URLs, so this always applies.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        url.to_string()
    }

    pub(crate) fn products_url(&self, query: &ListingQuery) -> String {
        let limit = query.limit.to_string();
        let offset = query.offset.to_string();
        let mut params = vec![
            ("limit", limit.as_str()),
            ("offset", offset.as_str()),
            ("compact", "1"),
        ];
        let filters = [
            ("brand", query.brand.as_deref()),
            ("model", query.model.as_deref()),
            ("category", query.category.as_deref()),
        ];
        for (key, value) in filters {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                params.push((key, value));
            }
        }
        self.endpoint(&["products"], &params)
    }

    pub(crate) fn product_url(&self, identifier: &str) -> String {
        self.endpoint(&["products", identifier], &[])
    }

    pub(crate) fn model_categories_url(&self, key: &ModelKey) -> String {
        self.endpoint(
            &["model-categories"],
            &[("brand", key.brand.as_str()), ("model", key.model.as_str())],
        )
    }

    /// Fetches a response body from upstream, retrying transient failures.
    ///
    /// Returns `Ok(None)` on HTTP 404.
    async fn fetch_body(&self, url: &str) -> Result<Option<String>, SourceError> {
        self.retry
            .run(url, || async move {
                let response = self
                    .client
                    .get(url)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Ok(None);
                }

                if !status.is_success() {
                    return Err(SourceError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_owned(),
                    });
                }

                Ok(Some(response.text().await?))
            })
            .await
    }

    /// Reads and decodes `url`, serving from the cache when fresh enough.
    ///
    /// Only bodies that decode are cached; 404s are never cached.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        freshness: Freshness,
        context: &str,
    ) -> Result<Option<T>, SourceError> {
        if let Some(body) = self.cache.get(url, freshness).await {
            return decode(&body, context).map(Some);
        }

        let Some(text) = self.fetch_body(url).await? else {
            tracing::debug!(url, "upstream returned 404");
            return Ok(None);
        };

        let value = decode(&text, context)?;
        self.cache.put(url, Arc::from(text)).await;
        Ok(Some(value))
    }

    /// Like [`Self::get_json`] but a 404 is an error: collection endpoints
    /// always exist.
    async fn get_required_json<T: DeserializeOwned>(
        &self,
        url: &str,
        freshness: Freshness,
        context: &str,
    ) -> Result<T, SourceError> {
        self.get_json(url, freshness, context)
            .await?
            .ok_or_else(|| SourceError::UnexpectedStatus {
                status: 404,
                url: url.to_owned(),
            })
    }
}

fn decode<T: DeserializeOwned>(body: &str, context: &str) -> Result<T, SourceError> {
    serde_json::from_str(body).map_err(|e| SourceError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}

#[async_trait]
impl TaxonomySource for HttpCatalogClient {
    async fn car_categories(
        &self,
        freshness: Freshness,
    ) -> Result<Vec<TaxonomyNode>, SourceError> {
        let url = self.endpoint(&["car-categories"], &[]);
        self.get_required_json(&url, freshness, "car categories")
            .await
    }

    async fn product_categories(
        &self,
        freshness: Freshness,
    ) -> Result<Vec<ProductCategory>, SourceError> {
        let url = self.endpoint(&["product-categories"], &[]);
        self.get_required_json(&url, freshness, "product categories")
            .await
    }

    async fn model_categories(
        &self,
        key: &ModelKey,
        freshness: Freshness,
    ) -> Result<Vec<String>, SourceError> {
        let url = self.model_categories_url(key);
        let context = format!("model categories for {}/{}", key.brand, key.model);
        self.get_required_json(&url, freshness, &context).await
    }
}

#[async_trait]
impl ProductIndex for HttpCatalogClient {
    async fn products_with_meta(
        &self,
        query: &ListingQuery,
        freshness: Freshness,
    ) -> Result<ListingResult, SourceError> {
        let url = self.products_url(query);
        self.get_required_json(&url, freshness, "product listing")
            .await
    }

    async fn product(
        &self,
        identifier: &str,
        freshness: Freshness,
    ) -> Result<Option<Product>, SourceError> {
        let url = self.product_url(identifier);
        let context = format!("product {identifier}");
        self.get_json(&url, freshness, &context).await
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
