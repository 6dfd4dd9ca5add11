use serde::{Deserialize, Deserializer, Serialize};

use crate::slug::strip_markup;

/// A flat product category, independent of the brand/model taxonomy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Compact product record returned by the product index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog article code, the canonical lookup identifier.
    #[serde(alias = "identifier")]
    pub article: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    /// Upstream sends either a single category name or a list of them.
    #[serde(default, deserialize_with = "one_or_many")]
    pub category: Vec<String>,
    /// Canonical URL path of the product detail page, e.g. `/item/spoiler-art123`.
    #[serde(default)]
    pub path: String,
}

impl Product {
    /// Plain-text model name.
    #[must_use]
    pub fn model_name(&self) -> String {
        strip_markup(&self.model)
    }

    /// Plain-text brand name.
    #[must_use]
    pub fn brand_name(&self) -> String {
        strip_markup(&self.brand)
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) if value.is_empty() => Vec::new(),
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
        OneOrMany::Null(()) => Vec::new(),
    })
}

/// A filter/pagination request against the product index.
///
/// Filters hold slugs; `None` means "not filtered on this dimension".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingQuery {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub category: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl ListingQuery {
    /// A query for the first `limit` products matching `brand`, used for
    /// model and brand name sampling.
    #[must_use]
    pub fn sample(brand: Option<&str>, limit: u32) -> Self {
        Self {
            brand: brand.filter(|b| !b.is_empty()).map(str::to_string),
            model: None,
            category: None,
            limit,
            offset: 0,
        }
    }
}

/// One page of products plus the total count over the whole filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingResult {
    #[serde(default)]
    pub items: Vec<Product>,
    #[serde(default)]
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_category_accepts_single_string() {
        let p: Product = serde_json::from_str(
            r#"{"article":"ART1","brand":"BMW","model":"X5","category":"Spoilers","path":"/item/a"}"#,
        )
        .unwrap();
        assert_eq!(p.category, vec!["Spoilers"]);
    }

    #[test]
    fn product_category_accepts_list_and_null() {
        let p: Product =
            serde_json::from_str(r#"{"article":"ART1","category":["A","B"]}"#).unwrap();
        assert_eq!(p.category, vec!["A", "B"]);

        let p: Product = serde_json::from_str(r#"{"article":"ART1","category":null}"#).unwrap();
        assert!(p.category.is_empty());
    }

    #[test]
    fn product_accepts_identifier_alias() {
        let p: Product = serde_json::from_str(r#"{"identifier":"ART9"}"#).unwrap();
        assert_eq!(p.article, "ART9");
        assert_eq!(p.path, "");
    }

    #[test]
    fn product_names_are_plain_text() {
        let p = Product {
            article: "ART1".to_string(),
            brand: "<b>Audi</b>".to_string(),
            model: "A4 <i>B8</i>".to_string(),
            ..Product::default()
        };
        assert_eq!(p.brand_name(), "Audi");
        assert_eq!(p.model_name(), "A4 B8");
    }

    #[test]
    fn sample_query_drops_empty_brand() {
        let q = ListingQuery::sample(Some(""), 30);
        assert!(q.brand.is_none());
        assert_eq!(q.limit, 30);
        assert_eq!(q.offset, 0);
    }
}
