//! Updating an existing clone

use super::command::{run_git, run_git_checked};
use crate::error::Result;
use camino::Utf8Path;
use std::time::Duration;
use tracing::{debug, info};

/// Fetch and rebase `branch` from origin, then refresh submodules
pub async fn pull_repository(path: &Utf8Path, branch: &str, limit: Duration) -> Result<()> {
    info!("Updating repository at {} ({})", path, branch);

    run_git_checked(Some(path), &["checkout", branch], limit).await?;
    run_git_checked(Some(path), &["pull", "-r", "origin", branch], limit).await?;
    run_git_checked(
        Some(path),
        &["submodule", "update", "--init", "--recursive"],
        limit,
    )
    .await?;

    debug!("Repository at {} is up to date", path);
    Ok(())
}

/// Get the URL of a remote, `None` when the remote is not configured
pub async fn get_remote_url(path: &Utf8Path, name: &str, limit: Duration) -> Result<Option<String>> {
    let key = format!("remote.{}.url", name);
    let output = run_git(Some(path), &["config", "--get", &key], limit).await?;

    if !output.status.success() {
        return Ok(None);
    }

    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok((!url.is_empty()).then_some(url))
}
