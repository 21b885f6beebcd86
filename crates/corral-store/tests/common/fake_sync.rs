//! In-memory repository sync

use async_trait::async_trait;
use corral_core::types::{CatalogSource, TemplateSource};
use corral_sync::{CatalogTree, Error, LoadProblem, RepositorySync, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Serves scripted template trees per catalog id
#[derive(Default)]
pub struct FakeSync {
    trees: Mutex<BTreeMap<String, Vec<TemplateSource>>>,
    problems: Mutex<BTreeMap<String, Vec<LoadProblem>>>,
    failing: Mutex<BTreeSet<String>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl FakeSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every sync by `delay`
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn set_templates(&self, catalog_id: &str, templates: Vec<TemplateSource>) {
        self.trees
            .lock()
            .unwrap()
            .insert(catalog_id.to_string(), templates);
    }

    pub fn add_problem(&self, catalog_id: &str, problem: LoadProblem) {
        self.problems
            .lock()
            .unwrap()
            .entry(catalog_id.to_string())
            .or_default()
            .push(problem);
    }

    pub fn set_failing(&self, catalog_id: &str, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(catalog_id.to_string());
        } else {
            set.remove(catalog_id);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepositorySync for FakeSync {
    async fn sync(&self, source: &CatalogSource) -> Result<CatalogTree> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.failing.lock().unwrap().contains(&source.id) {
            return Err(Error::clone_failed(format!("{} is unreachable", source.uri)));
        }

        Ok(CatalogTree {
            templates: self
                .trees
                .lock()
                .unwrap()
                .get(&source.id)
                .cloned()
                .unwrap_or_default(),
            problems: self
                .problems
                .lock()
                .unwrap()
                .get(&source.id)
                .cloned()
                .unwrap_or_default(),
        })
    }
}

/// Catalog source pointing nowhere in particular
pub fn source(id: &str) -> CatalogSource {
    CatalogSource::new(id, format!("https://git.example.com/{}.git", id), "master")
}
