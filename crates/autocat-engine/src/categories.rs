//! Category facet list built from the flat product-category source.

use std::collections::HashSet;

use autocat_core::{slug_equals, slugify, strip_markup, ProductCategory};
use serde::Serialize;

/// A category facet ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryFacet {
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl CategoryFacet {
    fn from_category(category: &ProductCategory) -> Option<Self> {
        let name = strip_markup(&category.name);
        if name.is_empty() {
            return None;
        }
        let slug = match category.slug.as_deref().map(str::trim) {
            Some(explicit) if !explicit.is_empty() => explicit.to_lowercase(),
            _ => slugify(&name),
        };
        if slug.is_empty() {
            return None;
        }
        Some(Self {
            name,
            slug,
            path: category.path.clone().filter(|p| !p.is_empty()),
        })
    }
}

/// Drops nameless entries, fills in missing slugs and removes duplicate
/// slugs, keeping source order and the first occurrence.
#[must_use]
pub fn merge_categories(categories: &[ProductCategory]) -> Vec<CategoryFacet> {
    merge_category_sources(categories, &[])
}

/// Like [`merge_categories`] over two sources; `primary` wins on slug clashes.
#[must_use]
pub fn merge_category_sources(
    primary: &[ProductCategory],
    secondary: &[ProductCategory],
) -> Vec<CategoryFacet> {
    let mut seen = HashSet::new();
    primary
        .iter()
        .chain(secondary)
        .filter_map(CategoryFacet::from_category)
        .filter(|facet| seen.insert(facet.slug.clone()))
        .collect()
}

/// Display name of the facet selected by `active_slug`, or empty.
#[must_use]
pub fn active_category_name(categories: &[CategoryFacet], active_slug: &str) -> String {
    if active_slug.is_empty() {
        return String::new();
    }
    categories
        .iter()
        .find(|c| slug_equals(&c.slug, active_slug))
        .map(|c| c.name.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(name: &str, slug: Option<&str>) -> ProductCategory {
        ProductCategory {
            name: name.to_string(),
            slug: slug.map(str::to_string),
            path: None,
        }
    }

    #[test]
    fn drops_empty_names_and_derives_slugs() {
        let merged = merge_categories(&[
            cat("Spoilers", None),
            cat("", Some("ghost")),
            cat("<p> </p>", None),
            cat("Rear Diffusers", None),
        ]);
        let slugs: Vec<_> = merged.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["spoilers", "rear-diffusers"]);
    }

    #[test]
    fn keeps_first_of_duplicate_slugs_in_source_order() {
        let merged = merge_categories(&[
            cat("Lips", Some("lips")),
            cat("Body kits", None),
            cat("LIPS (new)", Some("lips")),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "Lips");
        assert_eq!(merged[1].slug, "body-kits");
    }

    #[test]
    fn primary_source_wins() {
        let merged = merge_category_sources(
            &[cat("Spoilers", None)],
            &[cat("Spoilers (derived)", Some("spoilers")), cat("Mirrors", None)],
        );
        let names: Vec<_> = merged.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Spoilers", "Mirrors"]);
    }

    #[test]
    fn active_name_lookup() {
        let merged = merge_categories(&[cat("Spoilers", None)]);
        assert_eq!(active_category_name(&merged, "spoilers"), "Spoilers");
        assert_eq!(active_category_name(&merged, "mirrors"), "");
        assert_eq!(active_category_name(&merged, ""), "");
    }

    #[test]
    fn path_is_carried_when_present() {
        let merged = merge_categories(&[ProductCategory {
            name: "Spoilers".to_string(),
            slug: None,
            path: Some("/category/spoilers".to_string()),
        }]);
        assert_eq!(merged[0].path.as_deref(), Some("/category/spoilers"));
    }
}
