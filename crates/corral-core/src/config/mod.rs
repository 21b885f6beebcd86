//! Service configuration loading

mod loader;

pub use loader::{normalize_url, CatalogConfig, ServiceConfig, DEFAULT_CATALOG_ID};
