pub mod categories;
pub mod error;
pub mod listing;
pub mod page;
pub mod redirect;
pub mod scope;
pub mod seo;
pub mod taxonomy;

pub use categories::{
    active_category_name, merge_categories, merge_category_sources, CategoryFacet,
};
pub use error::EngineError;
pub use listing::{
    build_next_href, compute_offset, has_more, normalize_page, normalize_per_page, reset_key,
    ListingFilters, ALLOWED_PER_PAGE, DEFAULT_PER_PAGE,
};
pub use page::{
    BrandPage, CatalogEngine, CatalogPage, EngineConfig, Link, ListingWindow, ModelPage, PageParams,
};
pub use redirect::{
    category_redirect, resolve_by_identifier, resolve_composite, RedirectOutcome,
    PRODUCT_DETAIL_PREFIX,
};
pub use scope::RequestScope;
pub use seo::{has_active_filters, PageLevel, PageMeta, RawListingParams, SeoDirectives, SeoInput};
pub use taxonomy::{find_brand, find_model, merge_brands, merge_models, ModelMap, NavEntry};
