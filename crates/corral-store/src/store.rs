//! Catalog registry and snapshot publication
//!
//! Each catalog owns a status and a published [`CatalogSnapshot`]. A refresh
//! syncs the backing repository, builds a fresh snapshot outside any lock,
//! and swaps it in under a write lock held only for the swap. Readers clone
//! the `Arc` of the current snapshot and never observe a partial build.

use chrono::Utc;
use corral_core::types::{CatalogSource, CatalogState, CatalogStatus};
use corral_core::{BuildIssue, CatalogSnapshot, Error, IndexedTemplate, Result};
use corral_sync::{LoadProblem, RepositorySync};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Outcome of a refresh request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// A refresh task was started
    Started,
    /// A refresh of the catalog was already running; the request was dropped
    Coalesced,
}

/// Result of one completed sync and index cycle
#[derive(Debug)]
pub struct RefreshReport {
    pub catalog_id: String,

    /// Templates in the published snapshot
    pub templates: usize,

    /// Folders the loader could not read
    pub problems: Vec<LoadProblem>,

    /// Problems found while indexing
    pub issues: Vec<BuildIssue>,
}

impl RefreshReport {
    /// No unreadable folders and no template left out of the index
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty() && !self.issues.iter().any(BuildIssue::drops_template)
    }
}

/// Point-in-time view of a catalog
#[derive(Debug, Clone)]
pub struct CatalogView {
    pub source: CatalogSource,
    pub status: CatalogStatus,
    pub template_count: usize,
}

struct CatalogEntry {
    source: CatalogSource,
    status: RwLock<CatalogStatus>,
    snapshot: RwLock<Arc<CatalogSnapshot>>,
    refreshing: AtomicBool,
}

impl CatalogEntry {
    fn new(source: CatalogSource) -> Self {
        let snapshot = CatalogSnapshot::empty(&source.id);
        Self {
            source,
            status: RwLock::new(CatalogStatus::default()),
            snapshot: RwLock::new(Arc::new(snapshot)),
            refreshing: AtomicBool::new(false),
        }
    }

    fn status(&self) -> CatalogStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn update_status(&self, update: impl FnOnce(&mut CatalogStatus)) {
        let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut status);
    }

    fn publish(&self, snapshot: CatalogSnapshot) {
        let snapshot = Arc::new(snapshot);
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    fn view(&self) -> CatalogView {
        CatalogView {
            source: self.source.clone(),
            status: self.status(),
            template_count: self.snapshot().len(),
        }
    }
}

/// Holds the per-catalog refresh flag; clears it when dropped
struct RefreshGuard(Arc<CatalogEntry>);

impl RefreshGuard {
    fn acquire(entry: &Arc<CatalogEntry>) -> Option<Self> {
        entry
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(entry)))
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.0.refreshing.store(false, Ordering::Release);
    }
}

/// Registry of catalogs and their published indexes
pub struct CatalogStore {
    catalogs: BTreeMap<String, Arc<CatalogEntry>>,
    sync: Arc<dyn RepositorySync>,
}

impl CatalogStore {
    /// Register catalogs; each starts in `Syncing` with an empty snapshot
    pub fn new(sources: Vec<CatalogSource>, sync: Arc<dyn RepositorySync>) -> Self {
        let catalogs = sources
            .into_iter()
            .map(|source| (source.id.clone(), Arc::new(CatalogEntry::new(source))))
            .collect();
        Self { catalogs, sync }
    }

    /// Registered catalog ids in order
    pub fn catalog_ids(&self) -> impl Iterator<Item = &str> {
        self.catalogs.keys().map(String::as_str)
    }

    fn entry(&self, id: &str) -> Result<&Arc<CatalogEntry>> {
        self.catalogs
            .get(id)
            .ok_or_else(|| Error::catalog_not_found(id))
    }

    /// Start a background refresh of one catalog
    ///
    /// Returns immediately. When a refresh of the same catalog is already
    /// running the request is coalesced into it. Must be called from within
    /// a tokio runtime.
    pub fn refresh(&self, id: &str) -> Result<RefreshTrigger> {
        let entry = self.entry(id)?;
        let Some(guard) = RefreshGuard::acquire(entry) else {
            info!("Refresh of catalog {} already in progress, skipping", id);
            return Ok(RefreshTrigger::Coalesced);
        };

        let entry = Arc::clone(entry);
        let sync = Arc::clone(&self.sync);
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = run_cycle(&entry, sync.as_ref()).await {
                debug!("Background refresh ended with error: {}", e);
            }
        });

        Ok(RefreshTrigger::Started)
    }

    /// Start a background refresh of every catalog
    pub fn refresh_all(&self) {
        for id in self.catalogs.keys() {
            if let Err(e) = self.refresh(id) {
                warn!("Could not trigger refresh of {}: {}", id, e);
            }
        }
    }

    /// Run one sync and index cycle for every catalog and wait for it
    ///
    /// Fails when any catalog cannot be synced, has unreadable folders, or
    /// has templates left out of its index.
    pub async fn validate(&self) -> Result<Vec<RefreshReport>> {
        let mut reports = Vec::new();
        let mut failures = Vec::new();

        for (id, entry) in &self.catalogs {
            let Some(_guard) = RefreshGuard::acquire(entry) else {
                failures.push(format!("{}: refresh already in progress", id));
                continue;
            };

            match run_cycle(entry, self.sync.as_ref()).await {
                Ok(report) if report.is_clean() => reports.push(report),
                Ok(report) => {
                    let dropped = report
                        .issues
                        .iter()
                        .filter(|issue| issue.drops_template())
                        .count();
                    failures.push(format!(
                        "{}: {} unreadable folder(s), {} template(s) not indexed",
                        id,
                        report.problems.len(),
                        dropped
                    ));
                    reports.push(report);
                }
                Err(e) => failures.push(e.to_string()),
            }
        }

        if failures.is_empty() {
            Ok(reports)
        } else {
            Err(Error::sync_failure(
                self.catalogs.keys().cloned().collect::<Vec<_>>().join(","),
                failures.join("; "),
            ))
        }
    }

    /// Latest view of one catalog
    pub fn get_catalog(&self, id: &str) -> Result<CatalogView> {
        Ok(self.entry(id)?.view())
    }

    /// Latest view of every catalog, ordered by id
    pub fn list_catalogs(&self) -> Vec<CatalogView> {
        self.catalogs.values().map(|entry| entry.view()).collect()
    }

    /// Published snapshot of one catalog
    pub fn snapshot(&self, id: &str) -> Result<Arc<CatalogSnapshot>> {
        Ok(self.entry(id)?.snapshot())
    }

    /// Published snapshots of every catalog, ordered by catalog id
    pub fn snapshots(&self) -> Vec<Arc<CatalogSnapshot>> {
        self.catalogs.values().map(|entry| entry.snapshot()).collect()
    }

    /// Look up a template by catalog id and template name
    pub fn get_template(&self, catalog_id: &str, name: &str) -> Result<Arc<IndexedTemplate>> {
        self.snapshot(catalog_id)?
            .template(name)
            .cloned()
            .ok_or_else(|| Error::template_not_found(format!("{}:{}", catalog_id, name)))
    }

    /// Refresh every catalog on a fixed period until the task is aborted
    pub fn spawn_periodic_refresh(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately; startup already refreshed.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                debug!("Periodic catalog refresh");
                store.refresh_all();
            }
        })
    }
}

async fn run_cycle(entry: &CatalogEntry, sync: &dyn RepositorySync) -> Result<RefreshReport> {
    let id = entry.source.id.as_str();
    info!("Refreshing catalog {} from {} ({})", id, entry.source.uri, entry.source.branch);
    entry.update_status(|status| status.state = CatalogState::Syncing);

    let tree = match sync.sync(&entry.source).await {
        Ok(tree) => tree,
        Err(e) => {
            let message = e.to_string();
            warn!("Catalog {} sync failed: {}", id, message);
            entry.update_status(|status| {
                status.state = CatalogState::Error;
                status.message = Some(message.clone());
            });
            return Err(Error::sync_failure(id, message));
        }
    };

    for problem in &tree.problems {
        warn!("Catalog {}: {}", id, problem);
    }

    let (snapshot, issues) = CatalogSnapshot::build(id, tree.templates);
    for issue in &issues {
        warn!("Catalog {}: {}", id, issue.error);
    }

    let templates = snapshot.len();
    entry.publish(snapshot);
    entry.update_status(|status| {
        status.state = CatalogState::Active;
        status.message = None;
        status.last_updated = Some(Utc::now());
    });
    info!("Catalog {} indexed {} template(s)", id, templates);

    Ok(RefreshReport {
        catalog_id: id.to_string(),
        templates,
        problems: tree.problems,
        issues,
    })
}
