//! Repository cloning

use super::command::run_git;
use crate::error::{Error, Result};
use camino::Utf8Path;
use corral_core::types::DEFAULT_BRANCH;
use std::time::Duration;
use tracing::info;

/// Clone `url` into `destination`, including submodules
///
/// The branch flag is left off for the default branch so the remote's
/// checked-out branch is used.
///
/// # Errors
/// Returns error if:
/// - Destination already exists
/// - Clone operation fails or times out
pub async fn clone_repository(
    url: &str,
    destination: &Utf8Path,
    branch: &str,
    limit: Duration,
) -> Result<()> {
    info!("Cloning repository: {} -> {}", url, destination);

    if destination.exists() {
        return Err(Error::clone_failed(format!(
            "destination already exists: {}",
            destination
        )));
    }

    let mut args = vec!["clone", "--recursive"];
    if !branch.is_empty() && branch != DEFAULT_BRANCH {
        args.push("--branch");
        args.push(branch);
    }
    args.push("--");
    args.push(url);
    args.push(destination.as_str());

    let output = run_git(None, &args, limit).await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::clone_failed(stderr.trim()));
    }

    info!("Repository cloned successfully");
    Ok(())
}
