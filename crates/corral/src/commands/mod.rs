//! Command implementations

pub mod serve;
pub mod validate;

use crate::cli::Cli;
use anyhow::Result;
use corral_store::CatalogStore;
use corral_sync::GitSync;
use std::sync::Arc;

/// Build the catalog store for the configured catalogs, backed by git
/// checkouts under `--catalog-root`
pub(crate) fn build_store(cli: &Cli) -> Result<Arc<CatalogStore>> {
    let config = cli.service_config()?;
    let sync = GitSync::new(cli.catalog_root.clone(), cli.sync_timeout());
    Ok(Arc::new(CatalogStore::new(config.sources(), Arc::new(sync))))
}
