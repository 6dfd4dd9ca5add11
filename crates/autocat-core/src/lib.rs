pub mod app_config;
pub mod config;
pub mod products;
pub mod slug;
pub mod taxonomy;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{ListingQuery, ListingResult, Product, ProductCategory};
pub use slug::{compare_display, plain_text, slug_equals, slugify, strip_markup};
pub use taxonomy::{
    load_taxonomy_file, parse_taxonomy_file, ModelCategoryHints, RichBlock, RichText,
    TaxonomyFile, TaxonomyNode,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read taxonomy file {path}: {source}")]
    TaxonomyFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse taxonomy file: {0}")]
    TaxonomyFileParse(#[source] serde_yaml::Error),
}
