//! Brand → model taxonomy as delivered by the upstream catalog service.
//!
//! Names may arrive either as plain strings (sometimes carrying HTML markup)
//! or as structured rich-text block trees. Everything downstream works on the
//! plain-text projection produced by [`crate::slug::plain_text`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::products::ProductCategory;
use crate::slug::{plain_text, slugify};
use crate::ConfigError;

/// A display string that is either plain text or a rich-text block tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RichText {
    Plain(String),
    Rich(Vec<RichBlock>),
    Block(RichBlock),
}

impl Default for RichText {
    fn default() -> Self {
        RichText::Plain(String::new())
    }
}

impl From<&str> for RichText {
    fn from(value: &str) -> Self {
        RichText::Plain(value.to_string())
    }
}

impl From<String> for RichText {
    fn from(value: String) -> Self {
        RichText::Plain(value)
    }
}

/// One node of a rich-text tree. Only the text content matters here; marks,
/// links and other formatting attributes are ignored on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichBlock {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub children: Vec<RichBlock>,
}

/// A brand (top level) or model (child level) of the curated taxonomy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyNode {
    #[serde(default)]
    pub name: RichText,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub canonical: Option<String>,
    #[serde(default)]
    pub indexable: bool,
    #[serde(default)]
    pub seo_title: Option<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
    #[serde(default)]
    pub children: Vec<TaxonomyNode>,
}

impl TaxonomyNode {
    /// Plain-text display name.
    #[must_use]
    pub fn display_name(&self) -> String {
        plain_text(&self.name)
    }

    /// The explicit slug when present and non-blank, otherwise one derived
    /// from the display name.
    #[must_use]
    pub fn slug(&self) -> String {
        match self.slug.as_deref().map(str::trim) {
            Some(explicit) if !explicit.is_empty() => explicit.to_string(),
            _ => slugify(&self.display_name()),
        }
    }
}

/// Category hints attached to one brand/model pair in a taxonomy file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelCategoryHints {
    pub brand: String,
    pub model: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// On-disk taxonomy snapshot, an alternative to the upstream taxonomy endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomyFile {
    #[serde(default)]
    pub brands: Vec<TaxonomyNode>,
    #[serde(default)]
    pub categories: Vec<ProductCategory>,
    #[serde(default)]
    pub model_categories: Vec<ModelCategoryHints>,
}

/// Load a taxonomy snapshot from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed.
pub fn load_taxonomy_file(path: &Path) -> Result<TaxonomyFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TaxonomyFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_taxonomy_file(&content)
}

/// Parse a taxonomy snapshot from YAML text.
///
/// # Errors
///
/// Returns [`ConfigError::TaxonomyFileParse`] on malformed YAML.
pub fn parse_taxonomy_file(content: &str) -> Result<TaxonomyFile, ConfigError> {
    serde_yaml::from_str(content).map_err(ConfigError::TaxonomyFileParse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_name_deserializes_from_string() {
        let node: TaxonomyNode = serde_json::from_str(r#"{"name":"BMW"}"#).unwrap();
        assert_eq!(node.name, RichText::Plain("BMW".to_string()));
        assert!(node.children.is_empty());
        assert!(!node.indexable);
    }

    #[test]
    fn rich_name_deserializes_from_block_array() {
        let node: TaxonomyNode = serde_json::from_str(
            r#"{"name":[{"children":[{"text":"Mercedes"},{"text":"-Benz","bold":true}]}]}"#,
        )
        .unwrap();
        assert_eq!(node.display_name(), "Mercedes-Benz");
        assert_eq!(node.slug(), "mercedes-benz");
    }

    #[test]
    fn explicit_slug_wins_over_derived() {
        let node = TaxonomyNode {
            name: "Volkswagen".into(),
            slug: Some("vw".to_string()),
            ..TaxonomyNode::default()
        };
        assert_eq!(node.slug(), "vw");
    }

    #[test]
    fn blank_explicit_slug_falls_back_to_name() {
        let node = TaxonomyNode {
            name: "Land Rover".into(),
            slug: Some("  ".to_string()),
            ..TaxonomyNode::default()
        };
        assert_eq!(node.slug(), "land-rover");
    }

    #[test]
    fn taxonomy_file_parses_yaml() {
        let yaml = r"
brands:
  - name: BMW
    indexable: true
    canonical: https://shop.example/catalog/bmw
    children:
      - name: X5
      - name: 3 Series
        slug: 3-series
categories:
  - name: Spoilers
  - name: Diffusers
    slug: diffusers
model_categories:
  - brand: bmw
    model: x5
    categories: [Spoilers]
";
        let file = parse_taxonomy_file(yaml).unwrap();
        assert_eq!(file.brands.len(), 1);
        assert_eq!(file.brands[0].children.len(), 2);
        assert!(file.brands[0].indexable);
        assert_eq!(file.categories.len(), 2);
        assert_eq!(file.model_categories[0].categories, vec!["Spoilers"]);
    }

    #[test]
    fn taxonomy_file_rejects_malformed_yaml() {
        let err = parse_taxonomy_file("brands: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::TaxonomyFileParse(_)));
    }

    #[test]
    fn missing_taxonomy_file_reports_path() {
        let err = load_taxonomy_file(Path::new("/nonexistent/taxonomy.yaml")).unwrap_err();
        assert!(
            matches!(err, ConfigError::TaxonomyFileIo { ref path, .. } if path.contains("taxonomy.yaml"))
        );
    }
}
