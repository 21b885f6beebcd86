//! In-process API server over directory-backed catalogs

use super::fixtures::CatalogFixture;
use async_trait::async_trait;
use camino::Utf8PathBuf;
use corral::server::{self, AppState};
use corral_core::types::{CatalogSource, DEFAULT_BRANCH};
use corral_store::CatalogStore;
use corral_sync::{load_catalog, CatalogTree, RepositorySync};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Reads each catalog straight from `<root>/<catalog id>`, no git involved
pub struct DirectorySync {
    root: Utf8PathBuf,
}

impl DirectorySync {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl RepositorySync for DirectorySync {
    async fn sync(&self, source: &CatalogSource) -> corral_sync::Result<CatalogTree> {
        load_catalog(&self.root.join(&source.id))
    }
}

pub struct TestServer {
    /// `http://127.0.0.1:<port>/v1-catalog`
    pub base: String,
    pub store: Arc<CatalogStore>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.expect("GET request")
    }

    pub async fn get_json(&self, path: &str) -> serde_json::Value {
        let response = self.get(path).await;
        assert!(
            response.status().is_success(),
            "GET {} returned {}",
            path,
            response.status()
        );
        response.json().await.expect("JSON body")
    }

    pub async fn post(&self, path: &str) -> reqwest::Response {
        self.client.post(self.url(path)).send().await.expect("POST request")
    }
}

/// Index every catalog directory of `fixture` and serve it on an ephemeral port
pub async fn spawn_server(fixture: &CatalogFixture, catalogs: &[&str]) -> TestServer {
    let sources = catalogs
        .iter()
        .map(|id| CatalogSource::new(*id, format!("file://{}", fixture.catalog_dir(id)), DEFAULT_BRANCH))
        .collect();
    let store = Arc::new(CatalogStore::new(
        sources,
        Arc::new(DirectorySync::new(fixture.root())),
    ));
    store.validate().await.expect("fixture catalogs index cleanly");

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let state = AppState::new(Arc::clone(&store));
    tokio::spawn(server::serve(listener, state, std::future::pending::<()>()));

    TestServer {
        base: format!("http://{}/v1-catalog", addr),
        store,
        client: reqwest::Client::new(),
    }
}
