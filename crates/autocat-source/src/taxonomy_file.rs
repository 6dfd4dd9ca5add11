//! Taxonomy served from a local YAML snapshot instead of the upstream API.

use std::path::Path;

use async_trait::async_trait;
use autocat_core::{slug_equals, ProductCategory, TaxonomyFile, TaxonomyNode};

use crate::error::SourceError;
use crate::freshness::Freshness;
use crate::source::{ModelKey, TaxonomySource};

/// [`TaxonomySource`] backed by a [`TaxonomyFile`] loaded once at startup.
///
/// The snapshot is immutable, so freshness windows are irrelevant here.
#[derive(Debug, Clone, Default)]
pub struct FileTaxonomySource {
    file: TaxonomyFile,
}

impl FileTaxonomySource {
    #[must_use]
    pub fn new(file: TaxonomyFile) -> Self {
        Self { file }
    }

    /// Reads and parses the YAML snapshot at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::TaxonomyFile`] if the file is missing or malformed.
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let file = autocat_core::load_taxonomy_file(path)?;
        tracing::info!(
            path = %path.display(),
            brands = file.brands.len(),
            categories = file.categories.len(),
            "loaded taxonomy snapshot"
        );
        Ok(Self::new(file))
    }
}

#[async_trait]
impl TaxonomySource for FileTaxonomySource {
    async fn car_categories(
        &self,
        _freshness: Freshness,
    ) -> Result<Vec<TaxonomyNode>, SourceError> {
        Ok(self.file.brands.clone())
    }

    async fn product_categories(
        &self,
        _freshness: Freshness,
    ) -> Result<Vec<ProductCategory>, SourceError> {
        Ok(self.file.categories.clone())
    }

    async fn model_categories(
        &self,
        key: &ModelKey,
        _freshness: Freshness,
    ) -> Result<Vec<String>, SourceError> {
        Ok(self
            .file
            .model_categories
            .iter()
            .find(|hint| slug_equals(&hint.brand, &key.brand) && slug_equals(&hint.model, &key.model))
            .map(|hint| hint.categories.clone())
            .unwrap_or_default())
    }
}
