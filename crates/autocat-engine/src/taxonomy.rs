//! Taxonomy resolution: brand/model lookup by slug and reconciliation of the
//! curated tree with names mined from a bounded product sample.
//!
//! The tree is authoritative. A product sample is consulted only when the
//! tree has nothing to offer for the current level, and every merge is
//! first-write-wins keyed by slug.

use std::collections::HashSet;

use autocat_core::{compare_display, slug_equals, slugify, ListingQuery, Product, TaxonomyNode};
use autocat_source::{Freshness, ProductIndex};
use serde::Serialize;

use crate::error::EngineError;

/// Upper bound on products scanned when mining brand or model names.
pub const SAMPLE_LIMIT: u32 = 30;

/// One navigable brand or model: slug plus plain-text display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub slug: String,
    pub name: String,
}

/// Slug → display-name map that keeps the first name seen for each slug.
///
/// Used for both the model list of a brand and the brand list of the
/// catalog root.
#[derive(Debug, Clone, Default)]
pub struct ModelMap {
    entries: Vec<NavEntry>,
    seen: HashSet<String>,
}

impl ModelMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `name` under `slug` unless the slug is empty or already taken.
    /// Returns whether the entry was added.
    pub fn insert(&mut self, slug: String, name: String) -> bool {
        if slug.is_empty() || self.seen.contains(&slug) {
            return false;
        }
        self.seen.insert(slug.clone());
        self.entries.push(NavEntry { slug, name });
        true
    }

    pub fn extend_from_nodes(&mut self, nodes: &[TaxonomyNode]) {
        for node in nodes {
            self.insert(node.slug(), node.display_name());
        }
    }

    /// Adds names mined from products; `name_of` picks the product field.
    pub fn extend_from_products(&mut self, products: &[Product], name_of: fn(&Product) -> String) {
        for product in products {
            let name = name_of(product);
            self.insert(slugify(&name), name);
        }
    }

    /// Entries ordered by display name.
    #[must_use]
    pub fn into_sorted(mut self) -> Vec<NavEntry> {
        self.entries
            .sort_by(|a, b| compare_display(&a.name, &b.name));
        self.entries
    }
}

/// Finds the brand whose slug (explicit or derived from its name) matches.
#[must_use]
pub fn find_brand<'a>(tree: &'a [TaxonomyNode], brand_slug: &str) -> Option<&'a TaxonomyNode> {
    if brand_slug.is_empty() {
        return None;
    }
    tree.iter().find(|node| slug_equals(&node.slug(), brand_slug))
}

/// Finds a model among the children of `brand`.
#[must_use]
pub fn find_model<'a>(brand: &'a TaxonomyNode, model_slug: &str) -> Option<&'a TaxonomyNode> {
    if model_slug.is_empty() {
        return None;
    }
    brand
        .children
        .iter()
        .find(|node| slug_equals(&node.slug(), model_slug))
}

/// Whether model names must be mined from products for this brand.
#[must_use]
pub fn needs_product_sample(brand: Option<&TaxonomyNode>) -> bool {
    brand.is_none_or(|node| node.children.is_empty())
}

/// Fetches the bounded product sample for `brand_slug` when the tree has no
/// models for it; returns an empty sample without a read otherwise.
///
/// # Errors
///
/// Propagates [`EngineError::Source`] from the product index.
pub async fn brand_sample(
    index: &dyn ProductIndex,
    brand_slug: &str,
    brand: Option<&TaxonomyNode>,
    freshness: Freshness,
) -> Result<Vec<Product>, EngineError> {
    if !needs_product_sample(brand) {
        return Ok(Vec::new());
    }
    tracing::debug!(brand = %brand_slug, "no models in taxonomy, sampling products");
    let query = ListingQuery::sample(Some(brand_slug), SAMPLE_LIMIT);
    Ok(index.products(&query, freshness).await?)
}

/// Model list for a brand page: tree children when there are any, otherwise
/// distinct product models from `sample`.
#[must_use]
pub fn merge_models(brand: Option<&TaxonomyNode>, sample: &[Product]) -> Vec<NavEntry> {
    let mut models = ModelMap::new();
    if let Some(node) = brand {
        models.extend_from_nodes(&node.children);
    }
    if needs_product_sample(brand) {
        models.extend_from_products(sample, Product::model_name);
    }
    models.into_sorted()
}

/// Brand list for the catalog root: curated brands first, then brands seen
/// in the catalog-wide product sample.
#[must_use]
pub fn merge_brands(tree: &[TaxonomyNode], sample: &[Product]) -> Vec<NavEntry> {
    let mut brands = ModelMap::new();
    brands.extend_from_nodes(tree);
    brands.extend_from_products(sample, Product::brand_name);
    brands.into_sorted()
}

/// Display name for a brand: the node's name, else the brand of the first
/// sampled product, else the raw slug.
#[must_use]
pub fn brand_display_name(brand: Option<&TaxonomyNode>, sample: &[Product], brand_slug: &str) -> String {
    if let Some(node) = brand {
        let name = node.display_name();
        if !name.is_empty() {
            return name;
        }
    }
    sample
        .first()
        .map(Product::brand_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| brand_slug.to_string())
}

/// Display name for a model: the node's name, else the raw slug.
#[must_use]
pub fn model_display_name(model: Option<&TaxonomyNode>, model_slug: &str) -> String {
    model
        .map(TaxonomyNode::display_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| model_slug.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, children: Vec<TaxonomyNode>) -> TaxonomyNode {
        TaxonomyNode {
            name: name.into(),
            children,
            ..TaxonomyNode::default()
        }
    }

    fn product(brand: &str, model: &str) -> Product {
        Product {
            article: format!("{brand}-{model}"),
            brand: brand.to_string(),
            model: model.to_string(),
            ..Product::default()
        }
    }

    fn names(entries: &[NavEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn find_brand_matches_derived_and_explicit_slugs() {
        let tree = vec![
            node("Land Rover", vec![]),
            TaxonomyNode {
                name: "Volkswagen".into(),
                slug: Some("vw".to_string()),
                ..TaxonomyNode::default()
            },
        ];
        assert_eq!(
            find_brand(&tree, "land-rover").map(TaxonomyNode::display_name),
            Some("Land Rover".to_string())
        );
        assert!(find_brand(&tree, "vw").is_some());
        assert!(find_brand(&tree, "VW").is_some());
        assert!(find_brand(&tree, "volkswagen").is_none());
        assert!(find_brand(&tree, "").is_none());
    }

    #[test]
    fn find_model_within_brand() {
        let bmw = node("BMW", vec![node("X5 (G05)", vec![]), node("3 Series", vec![])]);
        assert!(find_model(&bmw, "x5-g05").is_some());
        assert!(find_model(&bmw, "x6").is_none());
    }

    #[test]
    fn tree_models_exclude_product_only_models() {
        let bmw = node("BMW", vec![node("X5", vec![])]);
        let sample = vec![product("BMW", "X6"), product("BMW", "M3")];
        let models = merge_models(Some(&bmw), &sample);
        assert_eq!(names(&models), vec!["X5"]);
    }

    #[test]
    fn empty_tree_derives_models_from_sample() {
        let audi = node("Audi", vec![]);
        let sample = vec![
            product("Audi", "Q7"),
            product("Audi", "<b>A4</b>"),
            product("Audi", "q7"),
            product("Audi", ""),
        ];
        let models = merge_models(Some(&audi), &sample);
        assert_eq!(names(&models), vec!["A4", "Q7"]);
        assert_eq!(models[1].slug, "q7");
    }

    #[test]
    fn missing_brand_node_derives_models_from_sample() {
        let models = merge_models(None, &[product("Skoda", "Octavia")]);
        assert_eq!(names(&models), vec!["Octavia"]);
    }

    #[test]
    fn empty_tree_and_empty_sample_yield_no_models() {
        assert!(merge_models(Some(&node("Audi", vec![])), &[]).is_empty());
    }

    #[test]
    fn brand_list_prefers_tree_names() {
        let tree = vec![node("BMW", vec![]), node("Škoda", vec![])];
        let sample = vec![product("bmw", "X5"), product("Audi", "A4")];
        let brands = merge_brands(&tree, &sample);
        assert_eq!(names(&brands), vec!["Audi", "BMW", "Škoda"]);
    }

    #[test]
    fn model_order_is_case_and_diacritic_insensitive() {
        let brand = node(
            "X",
            vec![node("beta", vec![]), node("Älpha", vec![]), node("Gamma", vec![])],
        );
        assert_eq!(
            names(&merge_models(Some(&brand), &[])),
            vec!["Älpha", "beta", "Gamma"]
        );
    }

    #[test]
    fn brand_name_falls_back_to_sample_then_slug() {
        let sample = vec![product("<i>Alfa Romeo</i>", "Giulia")];
        assert_eq!(brand_display_name(None, &sample, "alfa-romeo"), "Alfa Romeo");
        assert_eq!(brand_display_name(None, &[], "alfa-romeo"), "alfa-romeo");
        let node = node("Alfa Romeo", vec![]);
        assert_eq!(brand_display_name(Some(&node), &[], "x"), "Alfa Romeo");
    }

    #[test]
    fn model_name_falls_back_to_slug() {
        assert_eq!(model_display_name(None, "x5"), "x5");
    }

    #[test]
    fn model_map_is_first_write_wins() {
        let mut map = ModelMap::new();
        assert!(map.insert("x5".to_string(), "X5".to_string()));
        assert!(!map.insert("x5".to_string(), "x5 (other)".to_string()));
        assert!(!map.insert(String::new(), "Nameless".to_string()));
        let entries = map.into_sorted();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "X5");
    }
}
