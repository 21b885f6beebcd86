//! Corral - template catalog service
//!
//! Main entry point: serves the catalog API, or validates catalogs and exits.

use anyhow::{Context, Result};
use camino::Utf8Path;
use clap::Parser;
use corral::cli::Cli;
use corral::commands;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbosity(), cli.quiet, cli.log_file.as_deref())?;

    if cli.validate {
        commands::validate::run(&cli).await
    } else {
        commands::serve::run(&cli).await
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool, log_file: Option<&Utf8Path>) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let (stderr_layer, file_layer) = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (None, Some(layer))
        }
        None => (Some(fmt::layer().with_target(false)), None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(filter)
        .init();
    Ok(())
}
