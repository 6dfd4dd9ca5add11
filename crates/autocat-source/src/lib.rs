pub mod client;
pub mod error;
pub mod freshness;
mod retry;
pub mod source;
pub mod taxonomy_file;

pub use client::HttpCatalogClient;
pub use error::SourceError;
pub use freshness::{Freshness, ResponseCache};
pub use source::{ModelKey, ProductIndex, TaxonomySource};
pub use taxonomy_file::FileTaxonomySource;
