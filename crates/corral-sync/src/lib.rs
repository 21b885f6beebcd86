//! # corral-sync
//!
//! Repository sync for the Corral catalog service providing:
//! - Git clone/pull of catalog repositories with bounded run time
//! - Loading a catalog checkout into a parsed template tree
//! - Service bindings derived from compose files
//! - The [`RepositorySync`] seam used by the catalog store
//!
//! # Example
//!
//! ```no_run
//! use corral_core::types::CatalogSource;
//! use corral_sync::{GitSync, RepositorySync};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sync = GitSync::new("/var/lib/corral/DATA", Duration::from_secs(120));
//! let source = CatalogSource::new("library", "https://github.com/example/catalog.git", "master");
//! let tree = sync.sync(&source).await?;
//! println!("{} templates", tree.templates.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod git;
pub mod loader;
pub mod purge;
pub mod source;

pub use error::{Error, Result};
pub use loader::{load_catalog, CatalogTree, LoadProblem};
pub use purge::purge_unlisted;
pub use source::{GitSync, RepositorySync};
