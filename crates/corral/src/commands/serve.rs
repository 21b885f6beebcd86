//! Long-running catalog API server

use crate::cli::Cli;
use crate::server::{self, AppState};
use anyhow::{Context, Result};
use corral_sync::purge_unlisted;
use std::collections::BTreeSet;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub async fn run(cli: &Cli) -> Result<()> {
    let store = super::build_store(cli)?;

    let keep: BTreeSet<String> = store.catalog_ids().map(str::to_string).collect();
    match purge_unlisted(&cli.catalog_root, &keep) {
        Ok(removed) => {
            for dir in removed {
                info!("Removed checkout of unlisted catalog {}", dir);
            }
        }
        Err(e) => warn!("Could not purge {}: {}", cli.catalog_root, e),
    }

    store.refresh_all();
    let periodic = cli
        .refresh_period()
        .map(|period| store.spawn_periodic_refresh(period));

    let listener = TcpListener::bind(("0.0.0.0", cli.port))
        .await
        .with_context(|| format!("Failed to bind port {}", cli.port))?;
    info!("Listening on {}", listener.local_addr()?);

    server::serve(listener, AppState::new(store), shutdown_signal()).await?;

    if let Some(handle) = periodic {
        handle.abort();
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
