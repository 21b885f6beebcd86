//! CLI argument parsing with clap

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use corral_core::ServiceConfig;
use std::time::Duration;

/// Corral - template catalog service
#[derive(Parser, Debug)]
#[command(name = "corral")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Same as -v
    #[arg(long)]
    pub debug: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Append logs to this file instead of stderr
    #[arg(long, env = "CORRAL_LOG_FILE")]
    pub log_file: Option<Utf8PathBuf>,

    /// Catalog repository as `id=url`; repeatable, or comma separated
    ///
    /// A bare URL is registered as the `library` catalog.
    #[arg(long = "catalog-url", alias = "catalogUrl", value_name = "ID=URL", env = "CORRAL_CATALOG_URL")]
    pub catalog_urls: Vec<String>,

    /// YAML or JSON file listing catalogs under `catalogs:`
    #[arg(short, long, env = "CORRAL_CONFIG_FILE")]
    pub config_file: Option<Utf8PathBuf>,

    /// HTTP listen port
    #[arg(short, long, default_value_t = 8088, env = "CORRAL_PORT")]
    pub port: u16,

    /// Seconds between background refreshes of every catalog (0 disables)
    #[arg(long, default_value_t = 60)]
    pub refresh_interval: u64,

    /// Directory holding one checkout per catalog
    #[arg(long, default_value = "./DATA", env = "CORRAL_CATALOG_ROOT")]
    pub catalog_root: Utf8PathBuf,

    /// Seconds a single git command may run
    #[arg(long, default_value_t = 120)]
    pub sync_timeout: u64,

    /// Sync and index every catalog once, report problems, and exit
    #[arg(long)]
    pub validate: bool,
}

impl Cli {
    /// Effective verbosity, counting `--debug` as one `-v`
    pub fn verbosity(&self) -> u8 {
        self.verbose.max(u8::from(self.debug))
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout)
    }

    /// Background refresh period, `None` when disabled
    pub fn refresh_period(&self) -> Option<Duration> {
        (self.refresh_interval > 0).then(|| Duration::from_secs(self.refresh_interval))
    }

    /// Catalogs from `--catalog-url` merged with the config file; the file
    /// wins when both name the same catalog
    pub fn service_config(&self) -> Result<ServiceConfig> {
        let mut config = ServiceConfig::from_catalog_args(&self.catalog_urls)
            .context("Invalid --catalog-url value")?;

        if let Some(path) = &self.config_file {
            let from_file = ServiceConfig::load(path)
                .with_context(|| format!("Failed to load config file {}", path))?;
            config.merge(from_file);
        }

        if config.is_empty() {
            anyhow::bail!("No catalogs configured; pass --catalog-url or --config-file");
        }
        Ok(config)
    }
}
