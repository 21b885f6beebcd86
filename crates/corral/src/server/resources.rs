//! JSON resource shapes and absolute link construction

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use corral_core::types::{Question, ServiceBinding};
use corral_store::{CatalogView, TemplateMatch, VersionDetail};
use serde::Serialize;
use std::collections::BTreeMap;

/// Path prefix every route lives under
pub const API_PREFIX: &str = "/v1-catalog";

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Builds absolute resource URLs for the request being answered
///
/// The scheme comes from `X-Forwarded-Proto` (default `http`) and the
/// authority from `Host`.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    base: String,
}

impl UrlBuilder {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let scheme = headers
            .get(FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or("http");
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or("localhost");

        Self {
            base: format!("{}://{}{}", scheme, host, API_PREFIX),
        }
    }

    /// `<base>/<kind>s`
    pub fn collection(&self, kind: &str) -> String {
        format!("{}/{}s", self.base, kind)
    }

    /// `<base>/<kind>s/<id>`
    pub fn resource(&self, kind: &str, id: &str) -> String {
        format!("{}/{}s/{}", self.base, kind, id)
    }
}

/// Envelope of every list response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection<T> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub resource_type: &'static str,
    pub links: BTreeMap<&'static str, String>,
    pub data: Vec<T>,
}

impl<T> Collection<T> {
    pub fn new(resource_type: &'static str, self_link: String, data: Vec<T>) -> Self {
        Self {
            kind: "collection",
            resource_type,
            links: BTreeMap::from([("self", self_link)]),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub links: BTreeMap<&'static str, String>,
    pub uri: String,
    pub branch: String,
    pub state: String,
    pub message: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub template_count: usize,
    pub catalog_link: String,
}

impl CatalogResource {
    pub fn new(view: CatalogView, urls: &UrlBuilder) -> Self {
        let self_link = urls.resource("catalog", &view.source.id);
        let templates_link = format!("{}/templates", self_link);
        Self {
            id: view.source.id,
            kind: "catalog",
            links: BTreeMap::from([("self", self_link), ("templates", templates_link.clone())]),
            uri: view.source.uri,
            branch: view.source.branch,
            state: view.status.state.to_string(),
            message: view.status.message,
            last_updated: view.status.last_updated,
            template_count: view.template_count,
            catalog_link: templates_link,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub links: BTreeMap<&'static str, String>,
    pub catalog_id: String,
    pub template_base: String,
    pub is_system: bool,
    pub folder_name: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub default_version: Option<String>,
    pub maintainer: Option<String>,
    pub license: Option<String>,
    #[serde(rename = "projectURL")]
    pub project_url: Option<String>,
    pub labels: BTreeMap<String, String>,

    pub icon_link: Option<String>,
    pub readme_link: Option<String>,

    /// Version string to absolute version URL
    pub version_links: BTreeMap<String, String>,
}

impl TemplateResource {
    pub fn new(found: TemplateMatch, urls: &UrlBuilder) -> Self {
        let template = found.template;
        let metadata = template.metadata.clone();
        let icon_link = template.icon.as_ref().map(|_| urls.resource("image", &template.id));
        let readme_link = template
            .readme
            .as_ref()
            .map(|_| urls.resource("readme", &template.id));

        let mut links = BTreeMap::from([("self", urls.resource("template", &template.id))]);
        attach_asset_links(&mut links, &icon_link, &readme_link);

        Self {
            id: template.id.clone(),
            kind: "template",
            links,
            catalog_id: template.catalog_id.clone(),
            template_base: template.template_base.clone(),
            is_system: template.is_system,
            folder_name: template.folder.clone(),
            name: metadata.name,
            category: metadata.category,
            description: metadata.description,
            default_version: metadata.default_version,
            maintainer: metadata.maintainer,
            license: metadata.license,
            project_url: metadata.project_url,
            labels: metadata.labels,
            icon_link,
            readme_link,
            version_links: link_urls(found.version_links, urls),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub links: BTreeMap<&'static str, String>,
    pub template_id: String,
    pub catalog_id: String,
    pub template_base: String,
    pub is_system: bool,
    pub version: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub minimum_rancher_version: Option<String>,
    pub maximum_rancher_version: Option<String>,
    pub files: BTreeMap<String, String>,
    #[serde(rename = "fileLinksURL")]
    pub file_links_url: String,
    pub icon_link: Option<String>,
    pub readme_link: Option<String>,
    pub bindings: BTreeMap<String, ServiceBinding>,
    pub questions: Vec<Question>,

    /// Strictly greater versions passing the request's filters
    pub upgrade_version_links: BTreeMap<String, String>,
}

impl VersionResource {
    pub fn new(detail: VersionDetail, urls: &UrlBuilder) -> Self {
        let template = &detail.template;
        let version = detail.version();
        let file_links_url = urls.resource("file", &version.id);
        let icon_link = version.icon.as_ref().map(|_| urls.resource("image", &version.id));
        let readme_link = version
            .readme
            .as_ref()
            .map(|_| urls.resource("readme", &version.id));

        let mut links = BTreeMap::from([
            ("self", urls.resource("template", &version.id)),
            ("template", urls.resource("template", &template.id)),
            ("files", file_links_url.clone()),
        ]);
        attach_asset_links(&mut links, &icon_link, &readme_link);

        Self {
            id: version.id.clone(),
            kind: "templateVersion",
            links,
            template_id: template.id.clone(),
            catalog_id: template.catalog_id.clone(),
            template_base: template.template_base.clone(),
            is_system: template.is_system,
            version: version.version.clone(),
            name: version.name.clone(),
            description: version.description.clone(),
            minimum_rancher_version: version.minimum_platform_version.clone(),
            maximum_rancher_version: version.maximum_platform_version.clone(),
            files: version.files.clone(),
            file_links_url,
            icon_link,
            readme_link,
            bindings: version.bindings.clone(),
            questions: version.questions.clone(),
            upgrade_version_links: link_urls(detail.upgrade_links, urls),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeInfoResource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub current_version: String,
    pub new_version_links: BTreeMap<String, String>,
}

impl UpgradeInfoResource {
    pub fn new(detail: VersionDetail, urls: &UrlBuilder) -> Self {
        let version = detail.version();
        Self {
            id: version.id.clone(),
            kind: "upgradeInfo",
            current_version: version.version.clone(),
            new_version_links: link_urls(detail.upgrade_links, urls),
        }
    }
}

/// Files of one template version
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionFilesResource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub links: BTreeMap<&'static str, String>,

    /// Contents keyed by path relative to the version folder
    pub files: BTreeMap<String, String>,
}

impl VersionFilesResource {
    pub fn new(detail: VersionDetail, urls: &UrlBuilder) -> Self {
        let version = detail.version();
        Self {
            id: version.id.clone(),
            kind: "templateVersionFiles",
            links: BTreeMap::from([
                ("self", urls.resource("file", &version.id)),
                ("version", urls.resource("template", &version.id)),
            ]),
            files: version.files.clone(),
        }
    }
}

fn attach_asset_links(
    links: &mut BTreeMap<&'static str, String>,
    icon: &Option<String>,
    readme: &Option<String>,
) {
    if let Some(icon) = icon {
        links.insert("icon", icon.clone());
    }
    if let Some(readme) = readme {
        links.insert("readme", readme.clone());
    }
}

/// Turn a version string to version id map into version string to URL
fn link_urls(links: BTreeMap<String, String>, urls: &UrlBuilder) -> BTreeMap<String, String> {
    links
        .into_iter()
        .map(|(version, id)| (version, urls.resource("template", &id)))
        .collect()
}
