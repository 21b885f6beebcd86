//! # corral-core
//!
//! Core library for the Corral catalog service providing:
//! - Version string ordering with alpha/beta pre-release handling
//! - Platform compatibility ranges and query-time platform filters
//! - Parsed template trees and the per-catalog template index
//! - `upgrade_from` ranges restricting which versions may upgrade
//! - Service configuration loading (catalog sources)

pub mod compatibility;
pub mod config;
pub mod error;
pub mod index;
pub mod types;
pub mod upgrade;
pub mod version;

pub use compatibility::{CompatibilityRange, PlatformFilter};
pub use config::ServiceConfig;
pub use error::{Error, Result};
pub use index::{BuildIssue, CatalogSnapshot, IndexedTemplate, IndexedVersion};
pub use upgrade::UpgradeRange;
pub use version::CatalogVersion;
