//! Page composition for the three listing levels.
//!
//! Each page issues its independent reads concurrently through a fresh
//! [`RequestScope`], then folds taxonomy, categories and the product page into
//! one serializable model: sidebar facets, breadcrumbs, filter chips, the
//! product window with its continuation link, and SEO metadata.

use std::sync::Arc;

use autocat_core::{slug_equals, strip_markup, AppConfig, ListingQuery, Product};
use autocat_source::{Freshness, ModelKey, ProductIndex, TaxonomySource};
use serde::{Deserialize, Serialize};
use tokio::task::{JoinError, JoinHandle};

use crate::categories::{active_category_name, merge_categories, CategoryFacet};
use crate::error::EngineError;
use crate::listing::{
    self, build_next_href, compute_offset, encode_component, has_more, normalize_page,
    normalize_per_page, reset_key, ListingFilters,
};
use crate::redirect::{self, RedirectOutcome};
use crate::scope::RequestScope;
use crate::seo::{
    brand_meta, catalog_meta, has_active_filters, model_meta, PageLevel, PageMeta,
    RawListingParams,
};
use crate::taxonomy::{
    brand_display_name, brand_sample, find_brand, find_model, merge_brands, merge_models,
    model_display_name, NavEntry, SAMPLE_LIMIT,
};

/// Category hints shown on a model page.
const MAX_CATEGORY_HINTS: usize = 3;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub taxonomy_freshness: Freshness,
    pub listing_freshness: Freshness,
    /// Origin prefixed to the catalog root canonical URL.
    pub site_base_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            taxonomy_freshness: Freshness::TAXONOMY,
            listing_freshness: Freshness::LISTING,
            site_base_url: None,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            taxonomy_freshness: Freshness::new(config.taxonomy_freshness()),
            listing_freshness: Freshness::new(config.listing_freshness()),
            site_base_url: config.site_base_url.clone(),
        }
    }
}

/// Raw query parameters of a listing page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub pcat: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub gen: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "perPage")]
    pub per_page: Option<String>,
}

impl PageParams {
    fn raw(&self) -> RawListingParams<'_> {
        RawListingParams {
            pcat: self.pcat.as_deref(),
            brand: self.brand.as_deref(),
            model: self.model.as_deref(),
            gen: self.gen.as_deref(),
            page: self.page.as_deref(),
            per_page: self.per_page.as_deref(),
        }
    }
}

/// A navigation link. Breadcrumb tails carry no `href`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    pub active: bool,
}

impl Link {
    fn to(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: Some(href.into()),
            active: false,
        }
    }

    fn here(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: None,
            active: true,
        }
    }

    fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// One window of products plus what a client needs to continue scrolling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingWindow {
    pub items: Vec<Product>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub offset: u32,
    pub has_more: bool,
    pub next_href: Option<String>,
    pub reset_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogPage {
    pub meta: PageMeta,
    pub breadcrumbs: Vec<Link>,
    pub brands: Vec<Link>,
    pub categories: Vec<Link>,
    pub active_category: String,
    pub chips: Vec<Link>,
    pub reset_href: Option<String>,
    pub listing: ListingWindow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandPage {
    pub meta: PageMeta,
    pub brand: NavEntry,
    pub breadcrumbs: Vec<Link>,
    pub models: Vec<Link>,
    pub categories: Vec<Link>,
    pub active_category: String,
    pub chips: Vec<Link>,
    pub reset_href: Option<String>,
    pub listing: ListingWindow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelPage {
    pub meta: PageMeta,
    pub brand: NavEntry,
    pub model: NavEntry,
    pub category_hints: Vec<String>,
    pub breadcrumbs: Vec<Link>,
    pub models: Vec<Link>,
    pub categories: Vec<Link>,
    pub active_category: String,
    pub chips: Vec<Link>,
    pub reset_href: Option<String>,
    pub listing: ListingWindow,
}

/// Validated pagination for one request.
#[derive(Debug, Clone, Copy)]
struct Window {
    page: u32,
    per_page: u32,
    offset: u32,
}

impl Window {
    fn from_params(params: &PageParams) -> Self {
        let page = normalize_page(params.page.as_deref());
        let per_page = normalize_per_page(params.per_page.as_deref());
        Self {
            page,
            per_page,
            offset: compute_offset(page, per_page),
        }
    }

    fn into_listing(
        self,
        result: autocat_core::ListingResult,
        base_path: &str,
        href_filters: &ListingFilters,
        filters: &ListingFilters,
    ) -> ListingWindow {
        let more = has_more(&result, self.offset);
        ListingWindow {
            next_href: build_next_href(base_path, href_filters, self.per_page, self.page, more),
            reset_key: reset_key(filters, self.per_page, self.page),
            items: result.items,
            total: result.total,
            page: self.page,
            per_page: self.per_page,
            offset: self.offset,
            has_more: more,
        }
    }
}

/// Background model-hint read; aborted if dropped before it is joined.
struct HintTask(JoinHandle<Result<Vec<String>, EngineError>>);

impl HintTask {
    fn spawn(scope: &Arc<RequestScope>, key: ModelKey, freshness: Freshness) -> Self {
        let scope = Arc::clone(scope);
        Self(tokio::spawn(async move {
            Ok(scope.model_categories(&key, freshness).await?)
        }))
    }

    async fn join(mut self) -> Result<Result<Vec<String>, EngineError>, JoinError> {
        (&mut self.0).await
    }
}

impl Drop for HintTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Collapses the hint read into display strings; failures become no hints.
fn category_hints(joined: Result<Result<Vec<String>, EngineError>, JoinError>) -> Vec<String> {
    let hints = match joined {
        Ok(Ok(hints)) => hints,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "model category hints unavailable");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "model category hint task did not complete");
            Vec::new()
        }
    };
    hints
        .iter()
        .map(|hint| strip_markup(hint))
        .filter(|hint| !hint.is_empty())
        .take(MAX_CATEGORY_HINTS)
        .collect()
}

fn category_links(categories: &[CategoryFacet], base_path: &str, active_slug: &str) -> Vec<Link> {
    categories
        .iter()
        .map(|c| {
            Link::to(
                c.name.clone(),
                format!("{base_path}?pcat={}", encode_component(&c.slug)),
            )
            .active(c.slug == active_slug)
        })
        .collect()
}

fn model_links(models: &[NavEntry], brand_slug: &str, active_model: Option<&str>) -> Vec<Link> {
    models
        .iter()
        .map(|m| {
            Link::to(m.name.clone(), format!("/catalog/{brand_slug}/{}", m.slug))
                .active(active_model.is_some_and(|slug| slug_equals(&m.slug, slug)))
        })
        .collect()
}

fn lowercase(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Entry point for page composition and legacy redirects.
#[derive(Clone)]
pub struct CatalogEngine {
    taxonomy: Arc<dyn TaxonomySource>,
    index: Arc<dyn ProductIndex>,
    config: EngineConfig,
}

impl CatalogEngine {
    #[must_use]
    pub fn new(
        taxonomy: Arc<dyn TaxonomySource>,
        index: Arc<dyn ProductIndex>,
        config: EngineConfig,
    ) -> Self {
        Self {
            taxonomy,
            index,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A fresh memoizing scope for one request.
    #[must_use]
    pub fn scope(&self) -> Arc<RequestScope> {
        Arc::new(RequestScope::new(
            Arc::clone(&self.taxonomy),
            Arc::clone(&self.index),
        ))
    }

    /// `/catalog`: every brand, every category, optional query filters.
    ///
    /// # Errors
    ///
    /// Fails if any critical read fails.
    pub async fn catalog_page(&self, params: &PageParams) -> Result<CatalogPage, EngineError> {
        let scope = self.scope();
        let (taxonomy_f, listing_f) = (self.config.taxonomy_freshness, self.config.listing_freshness);
        let window = Window::from_params(params);
        let filters = ListingFilters::from_raw(
            params.pcat.as_deref(),
            params.brand.as_deref(),
            params.model.as_deref(),
            params.gen.as_deref(),
        );
        let sample_query = ListingQuery::sample(None, SAMPLE_LIMIT);

        let (result, tree, product_categories, sample) = tokio::try_join!(
            listing::query(&*scope, &filters, window.per_page, window.offset, listing_f),
            async { Ok::<_, EngineError>(scope.car_categories(taxonomy_f).await?) },
            async { Ok::<_, EngineError>(scope.product_categories(taxonomy_f).await?) },
            async { Ok::<_, EngineError>(scope.products(&sample_query, listing_f).await?) },
        )?;

        let brands = merge_brands(&tree, &sample)
            .into_iter()
            .map(|b| Link::to(b.name, format!("/catalog/{}", b.slug)))
            .collect();
        let categories = merge_categories(&product_categories);
        let active_category = active_category_name(&categories, &filters.category);

        let mut chips = Vec::new();
        let mut reset_href = None;
        if !active_category.is_empty() {
            chips.push(Link::to(active_category.clone(), "/catalog"));
            reset_href = Some("/catalog".to_string());
        }

        let filtered = has_active_filters(&params.raw(), PageLevel::Catalog);
        let meta = catalog_meta(filtered, result.total, self.config.site_base_url.as_deref());

        Ok(CatalogPage {
            meta,
            breadcrumbs: vec![Link::to("Home", "/"), Link::here("Catalog")],
            brands,
            categories: category_links(&categories, "/catalog", &filters.category),
            active_category,
            chips,
            reset_href,
            listing: window.into_listing(result, "/catalog", &filters, &filters),
        })
    }

    /// `/catalog/{brand}`.
    ///
    /// # Errors
    ///
    /// Fails if any critical read fails.
    pub async fn brand_page(
        &self,
        brand: &str,
        params: &PageParams,
    ) -> Result<BrandPage, EngineError> {
        let scope = self.scope();
        let (taxonomy_f, listing_f) = (self.config.taxonomy_freshness, self.config.listing_freshness);
        let brand_slug = lowercase(brand);
        let window = Window::from_params(params);
        let filters = ListingFilters::from_raw(params.pcat.as_deref(), Some(&brand_slug), None, None);

        let (tree, product_categories, result) = tokio::try_join!(
            async { Ok::<_, EngineError>(scope.car_categories(taxonomy_f).await?) },
            async { Ok::<_, EngineError>(scope.product_categories(taxonomy_f).await?) },
            listing::query(&*scope, &filters, window.per_page, window.offset, listing_f),
        )?;

        let brand_node = find_brand(&tree, &brand_slug);
        let sample = brand_sample(&*scope, &brand_slug, brand_node, listing_f).await?;
        let brand_name = brand_display_name(brand_node, &sample, &brand_slug);
        let models = merge_models(brand_node, &sample);

        let categories = merge_categories(&product_categories);
        let active_category = active_category_name(&categories, &filters.category);
        let base_path = format!("/catalog/{brand_slug}");

        let mut chips = vec![Link::to(brand_name.clone(), "/catalog")];
        if !active_category.is_empty() {
            chips.push(Link::to(active_category.clone(), base_path.clone()));
        }

        let filtered = has_active_filters(&params.raw(), PageLevel::Brand);
        let meta = brand_meta(brand_node, &brand_name, filtered, result.total);
        let href_filters = ListingFilters {
            category: filters.category.clone(),
            ..ListingFilters::default()
        };

        Ok(BrandPage {
            meta,
            breadcrumbs: vec![
                Link::to("Home", "/"),
                Link::to("Catalog", "/catalog"),
                Link::here(brand_name.clone()),
            ],
            models: model_links(&models, &brand_slug, None),
            categories: category_links(&categories, &base_path, &filters.category),
            active_category,
            chips,
            reset_href: Some(base_path.clone()),
            listing: window.into_listing(result, &base_path, &href_filters, &filters),
            brand: NavEntry {
                slug: brand_slug,
                name: brand_name,
            },
        })
    }

    /// `/catalog/{brand}/{model}`.
    ///
    /// Category facets are the global list, not narrowed to this model.
    ///
    /// # Errors
    ///
    /// Fails if any critical read fails. Hint failures only empty the hints.
    pub async fn model_page(
        &self,
        brand: &str,
        model: &str,
        params: &PageParams,
    ) -> Result<ModelPage, EngineError> {
        let scope = self.scope();
        let (taxonomy_f, listing_f) = (self.config.taxonomy_freshness, self.config.listing_freshness);
        let brand_slug = lowercase(brand);
        let model_slug = lowercase(model);
        let window = Window::from_params(params);
        let filters = ListingFilters::from_raw(
            params.pcat.as_deref(),
            Some(&brand_slug),
            Some(&model_slug),
            None,
        );

        let hints = HintTask::spawn(
            &scope,
            ModelKey::new(brand_slug.clone(), model_slug.clone()),
            taxonomy_f,
        );

        let (tree, product_categories, result) = tokio::try_join!(
            async { Ok::<_, EngineError>(scope.car_categories(taxonomy_f).await?) },
            async { Ok::<_, EngineError>(scope.product_categories(taxonomy_f).await?) },
            listing::query(&*scope, &filters, window.per_page, window.offset, listing_f),
        )?;

        let brand_node = find_brand(&tree, &brand_slug);
        let model_node = brand_node.and_then(|node| find_model(node, &model_slug));
        let sample = brand_sample(&*scope, &brand_slug, brand_node, listing_f).await?;
        let brand_name = brand_display_name(brand_node, &sample, &brand_slug);
        let model_name = model_display_name(model_node, &model_slug);
        let models = merge_models(brand_node, &sample);

        let categories = merge_categories(&product_categories);
        let active_category = active_category_name(&categories, &filters.category);
        let brand_path = format!("/catalog/{brand_slug}");
        let base_path = format!("{brand_path}/{model_slug}");

        let mut chips = vec![
            Link::to(brand_name.clone(), brand_path.clone()),
            Link::to(model_name.clone(), base_path.clone()),
        ];
        if !active_category.is_empty() {
            chips.push(Link::to(active_category.clone(), base_path.clone()));
        }

        let filtered = has_active_filters(&params.raw(), PageLevel::Model);
        let meta = model_meta(model_node, &model_name, &brand_name, filtered, result.total);
        let href_filters = ListingFilters {
            category: filters.category.clone(),
            ..ListingFilters::default()
        };
        let category_hints = category_hints(hints.join().await);

        Ok(ModelPage {
            meta,
            category_hints,
            breadcrumbs: vec![
                Link::to("Home", "/"),
                Link::to("Catalog", "/catalog"),
                Link::to(brand_name.clone(), brand_path),
                Link::here(model_name.clone()),
            ],
            models: model_links(&models, &brand_slug, Some(&model_slug)),
            categories: category_links(&categories, &base_path, &filters.category),
            active_category,
            chips,
            reset_href: Some(base_path.clone()),
            listing: window.into_listing(result, &base_path, &href_filters, &filters),
            brand: NavEntry {
                slug: brand_slug,
                name: brand_name,
            },
            model: NavEntry {
                slug: model_slug,
                name: model_name,
            },
        })
    }

    /// `/p/{identifier}/{slug}`.
    ///
    /// # Errors
    ///
    /// Fails only when the lookup itself fails.
    pub async fn resolve_by_identifier(&self, raw: &str) -> Result<RedirectOutcome, EngineError> {
        redirect::resolve_by_identifier(&*self.index, raw, self.config.listing_freshness).await
    }

    /// `/product/{composite}`.
    ///
    /// # Errors
    ///
    /// Fails only when the lookup itself fails.
    pub async fn resolve_composite(&self, raw: &str) -> Result<RedirectOutcome, EngineError> {
        redirect::resolve_composite(&*self.index, raw, self.config.listing_freshness).await
    }
}
