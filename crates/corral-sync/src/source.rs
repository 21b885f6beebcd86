//! Repository sync seam

use crate::error::{Error, Result};
use crate::git::{clone_repository, get_remote_url, pull_repository};
use crate::loader::{load_catalog, CatalogTree};
use async_trait::async_trait;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use corral_core::types::CatalogSource;
use std::time::Duration;
use tracing::{info, warn};

/// Brings a catalog's backing repository up to date and reads it
///
/// The catalog store calls this once per refresh and indexes the result.
#[async_trait]
pub trait RepositorySync: Send + Sync {
    /// Sync the repository of `source` and load its template tree
    async fn sync(&self, source: &CatalogSource) -> Result<CatalogTree>;
}

/// Git-backed sync keeping one checkout per catalog under `root`
#[derive(Debug, Clone)]
pub struct GitSync {
    root: Utf8PathBuf,
    timeout: Duration,
}

impl GitSync {
    pub fn new(root: impl Into<Utf8PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Checkout directory of a catalog, always a direct child of the root
    ///
    /// Checkouts get removed and re-cloned, so an id that is not a single
    /// plain path component (`..`, `.`, `a/b`) is refused.
    pub fn checkout_dir(&self, catalog_id: &str) -> Result<Utf8PathBuf> {
        let mut components = Utf8Path::new(catalog_id).components();
        match (components.next(), components.next()) {
            (Some(Utf8Component::Normal(name)), None)
                if name == catalog_id && !name.starts_with('.') =>
            {
                Ok(self.root.join(name))
            }
            _ => Err(Error::invalid_catalog_id(catalog_id)),
        }
    }

    async fn update_checkout(&self, source: &CatalogSource) -> Result<Utf8PathBuf> {
        let dir = self.checkout_dir(&source.id)?;
        tokio::fs::create_dir_all(&self.root).await?;

        if dir.join(".git").exists() {
            match get_remote_url(&dir, "origin", self.timeout).await? {
                Some(url) if url == source.uri => {
                    pull_repository(&dir, &source.branch, self.timeout).await?;
                    return Ok(dir);
                }
                current => {
                    info!(
                        "Catalog {} remote changed ({} -> {}), cloning again",
                        source.id,
                        current.as_deref().unwrap_or("none"),
                        source.uri
                    );
                    tokio::fs::remove_dir_all(&dir).await?;
                }
            }
        } else if dir.exists() {
            warn!("{} is not a git checkout, replacing it", dir);
            tokio::fs::remove_dir_all(&dir).await?;
        }

        if let Err(e) = clone_repository(&source.uri, &dir, &source.branch, self.timeout).await {
            if dir.exists() {
                let _ = tokio::fs::remove_dir_all(&dir).await;
            }
            return Err(e);
        }
        Ok(dir)
    }
}

#[async_trait]
impl RepositorySync for GitSync {
    async fn sync(&self, source: &CatalogSource) -> Result<CatalogTree> {
        let dir = self.update_checkout(source).await?;

        tokio::task::spawn_blocking(move || load_catalog(&dir))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?
    }
}
