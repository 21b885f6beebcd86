//! `/v1-catalog` HTTP API

mod error;
mod handlers;
mod resources;

pub use error::{ApiError, ErrorBody};
pub use resources::{
    CatalogResource, Collection, TemplateResource, UpgradeInfoResource, UrlBuilder,
    VersionFilesResource, VersionResource, API_PREFIX,
};

use axum::routing::get;
use axum::Router;
use corral_store::{CatalogStore, QueryEngine};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared state of every handler
#[derive(Clone)]
pub struct AppState {
    query: QueryEngine,
}

impl AppState {
    pub fn new(store: Arc<CatalogStore>) -> Self {
        Self {
            query: QueryEngine::new(store),
        }
    }

    pub fn query(&self) -> &QueryEngine {
        &self.query
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        self.query.store()
    }
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/catalogs", get(handlers::list_catalogs))
        .route(
            "/catalogs/{id}",
            get(handlers::get_catalog).post(handlers::refresh_catalog),
        )
        .route("/catalogs/{id}/templates", get(handlers::list_catalog_templates))
        .route(
            "/templates",
            get(handlers::list_templates).post(handlers::refresh_templates),
        )
        .route("/templates/{id}", get(handlers::get_template))
        .route("/upgradeinfo/{id}", get(handlers::get_upgrade_info))
        .route("/files/{id}", get(handlers::get_version_files))
        .route("/images/{id}", get(handlers::get_icon))
        .route("/readmes/{id}", get(handlers::get_readme));

    Router::new()
        .nest(API_PREFIX, api)
        .fallback(handlers::not_found)
        .with_state(state)
}

/// Serve the API on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
