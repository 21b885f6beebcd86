//! One-shot catalog validation

use crate::cli::Cli;
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Sync and index every catalog once
///
/// Returns an error, and so a non-zero exit status, when any catalog fails
/// to sync, has unreadable folders, or leaves templates out of its index.
pub async fn run(cli: &Cli) -> Result<()> {
    let store = super::build_store(cli)?;

    let reports = store.validate().await.context("Catalog validation failed")?;

    for report in &reports {
        for issue in &report.issues {
            warn!("{}: {}", report.catalog_id, issue.error);
        }
        info!(
            "Catalog {}: {} template(s) indexed",
            report.catalog_id, report.templates
        );
    }
    info!("Validated {} catalog(s)", reports.len());
    Ok(())
}
