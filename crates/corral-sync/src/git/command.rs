//! Bounded git process execution

use crate::error::{Error, Result};
use camino::Utf8Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Run `git <args>` in `dir`, failing with `Timeout` after `limit`
///
/// The child is killed when the future is dropped, so a timed-out command
/// does not linger.
pub(crate) async fn run_git(dir: Option<&Utf8Path>, args: &[&str], limit: Duration) -> Result<Output> {
    let mut cmd = Command::new("git");
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    cmd.args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .kill_on_drop(true);

    debug!("Running: git {}", args.join(" "));
    let subcommand = args.first().copied().unwrap_or("git");

    match tokio::time::timeout(limit, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::GitNotFound),
        Ok(Err(e)) => Err(Error::Io(e)),
        Err(_) => Err(Error::timeout(subcommand, limit.as_secs())),
    }
}

/// Run a git command and turn a non-zero exit into `GitOperation`
pub(crate) async fn run_git_checked(
    dir: Option<&Utf8Path>,
    args: &[&str],
    limit: Duration,
) -> Result<Output> {
    let output = run_git(dir, args, limit).await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::git_operation(format!(
            "git {} failed: {}",
            args.first().copied().unwrap_or_default(),
            stderr.trim()
        )));
    }
    Ok(output)
}
