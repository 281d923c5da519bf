//! Catalog services composed over the [`CatalogStore`](pawtrait_db::CatalogStore)
//! and [`ObjectStorage`](pawtrait_storage::ObjectStorage) seams.

pub mod catalog_query;
pub mod ingestion;
pub mod usage;
pub mod views;

pub use catalog_query::CatalogQueryService;
pub use ingestion::IngestionService;
pub use usage::UsageService;
