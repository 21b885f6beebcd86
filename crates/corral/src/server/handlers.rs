//! Route handlers

use super::error::ApiError;
use super::resources::{
    CatalogResource, Collection, TemplateResource, UpgradeInfoResource, UrlBuilder,
    VersionFilesResource, VersionResource,
};
use super::AppState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use corral_core::Error;
use corral_store::{
    AssetKind, CatalogQuery, ResourceId, RefreshTrigger, TemplateQuery, VersionQuery,
};
use tracing::{debug, info};

/// Raw `name=value` pairs in request order
type Params = Result<Query<Vec<(String, String)>>, QueryRejection>;

fn params(raw: Params) -> Result<Vec<(String, String)>, ApiError> {
    raw.map(|Query(pairs)| pairs)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

/// Accept `action=refresh` or a bare `refresh`; reject every other action
fn require_refresh_action(pairs: &[(String, String)]) -> Result<(), ApiError> {
    let mut requested = false;
    for (name, value) in pairs {
        match (name.as_str(), value.as_str()) {
            ("action", "refresh") | ("refresh", _) => requested = true,
            ("action", other) => {
                return Err(ApiError::bad_request(format!("Unsupported action '{}'", other)))
            }
            _ => {}
        }
    }
    if requested {
        Ok(())
    } else {
        Err(ApiError::bad_request("Expected action=refresh"))
    }
}

pub(super) async fn list_catalogs(
    State(state): State<AppState>,
    headers: HeaderMap,
    raw: Params,
) -> Result<Json<Collection<CatalogResource>>, ApiError> {
    let query = CatalogQuery::parse(params(raw)?)?;
    let urls = UrlBuilder::from_headers(&headers);

    let data = state
        .query()
        .list_catalogs(&query)
        .into_iter()
        .map(|view| CatalogResource::new(view, &urls))
        .collect();
    Ok(Json(Collection::new("catalog", urls.collection("catalog"), data)))
}

pub(super) async fn get_catalog(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<CatalogResource>, ApiError> {
    let view = state.store().get_catalog(&id)?;
    Ok(Json(CatalogResource::new(view, &UrlBuilder::from_headers(&headers))))
}

pub(super) async fn refresh_catalog(
    State(state): State<AppState>,
    Path(id): Path<String>,
    raw: Params,
) -> Result<StatusCode, ApiError> {
    require_refresh_action(&params(raw)?)?;
    if state.store().refresh(&id)? == RefreshTrigger::Started {
        info!("Refresh of catalog {} requested", id);
    }
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn list_catalog_templates(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    raw: Params,
) -> Result<Json<Collection<TemplateResource>>, ApiError> {
    let query = TemplateQuery::parse(params(raw)?)?;
    let urls = UrlBuilder::from_headers(&headers);

    let data = state
        .query()
        .list_catalog_templates(&id, &query)?
        .into_iter()
        .map(|found| TemplateResource::new(found, &urls))
        .collect();
    let self_link = format!("{}/templates", urls.resource("catalog", &id));
    Ok(Json(Collection::new("template", self_link, data)))
}

pub(super) async fn list_templates(
    State(state): State<AppState>,
    headers: HeaderMap,
    raw: Params,
) -> Result<Json<Collection<TemplateResource>>, ApiError> {
    let query = TemplateQuery::parse(params(raw)?)?;
    let urls = UrlBuilder::from_headers(&headers);

    let data = state
        .query()
        .list_templates(&query)
        .into_iter()
        .map(|found| TemplateResource::new(found, &urls))
        .collect();
    Ok(Json(Collection::new("template", urls.collection("template"), data)))
}

pub(super) async fn refresh_templates(
    State(state): State<AppState>,
    raw: Params,
) -> Result<StatusCode, ApiError> {
    require_refresh_action(&params(raw)?)?;
    info!("Refresh of all catalogs requested");
    state.store().refresh_all();
    Ok(StatusCode::NO_CONTENT)
}

/// Template detail for `catalog:name`, version detail for `catalog:name:folder`
pub(super) async fn get_template(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    raw: Params,
) -> Result<Response, ApiError> {
    let query = VersionQuery::parse(params(raw)?)?;
    let urls = UrlBuilder::from_headers(&headers);

    let response = match ResourceId::parse(&id)? {
        ResourceId::Template { catalog, name } => {
            let found = state.query().get_template(&catalog, &name, &query)?;
            Json(TemplateResource::new(found, &urls)).into_response()
        }
        ResourceId::Version {
            catalog,
            name,
            folder,
        } => {
            let detail = state
                .query()
                .version_detail(&catalog, &name, &folder, &query)?;
            Json(VersionResource::new(detail, &urls)).into_response()
        }
    };
    Ok(response)
}

/// Current version and every strictly greater version it may upgrade to
pub(super) async fn get_upgrade_info(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<UpgradeInfoResource>, ApiError> {
    let (catalog, name, folder) = version_id(id)?;
    let detail = state.query().upgrade_info(&catalog, &name, &folder)?;
    Ok(Json(UpgradeInfoResource::new(
        detail,
        &UrlBuilder::from_headers(&headers),
    )))
}

/// Split a version id, treating a template id as a missing version
fn version_id(id: String) -> Result<(String, String, String), ApiError> {
    match ResourceId::parse(&id)? {
        ResourceId::Version {
            catalog,
            name,
            folder,
        } => Ok((catalog, name, folder)),
        ResourceId::Template { .. } => Err(Error::version_not_found(id).into()),
    }
}

pub(super) async fn get_version_files(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<VersionFilesResource>, ApiError> {
    let (catalog, name, folder) = version_id(id)?;
    let detail = state
        .query()
        .version_detail(&catalog, &name, &folder, &VersionQuery::default())?;
    Ok(Json(VersionFilesResource::new(
        detail,
        &UrlBuilder::from_headers(&headers),
    )))
}

fn serve_asset(state: &AppState, id: &str, kind: AssetKind) -> Result<Response, ApiError> {
    let asset = state.query().asset(&ResourceId::parse(id)?, kind)?;
    debug!("Serving {} for {}", asset.file_name, id);
    Ok((
        [(header::CONTENT_TYPE, asset.media_type())],
        asset.content.clone(),
    )
        .into_response())
}

/// Raw icon bytes of a template or version
pub(super) async fn get_icon(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    serve_asset(&state, &id, AssetKind::Icon)
}

/// Raw README of a template or version
pub(super) async fn get_readme(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    serve_asset(&state, &id, AssetKind::Readme)
}

pub(super) async fn not_found(uri: Uri) -> ApiError {
    debug!("No route for {}", uri);
    ApiError::not_found(format!("Not found: {}", uri.path()))
}
