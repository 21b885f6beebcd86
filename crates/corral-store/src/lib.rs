//! # corral-store
//!
//! Catalog state for the Corral service providing:
//! - [`CatalogStore`]: registered catalogs, their lifecycle state, and the
//!   atomically published template index of each
//! - Coalesced, fire-and-forget refresh and a blocking validate pass
//! - [`QueryEngine`]: typed filter clauses evaluated against published
//!   snapshots

pub mod query;
pub mod store;

pub use query::{
    AssetKind, CatalogQuery, QueryEngine, ResourceId, TemplateMatch, TemplateQuery, VersionDetail,
    VersionQuery,
};
pub use store::{CatalogStore, CatalogView, RefreshReport, RefreshTrigger};
