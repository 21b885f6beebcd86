//! Filter parsing and evaluation over published snapshots
//!
//! Filters arrive as `name=value` pairs where `name` is a field optionally
//! followed by `_eq`, `_ne`, `_lte` or `_gte` (a bare field means `_eq`).
//! Every resource accepts a closed set of fields and operators; anything
//! else is rejected with `InvalidFilter`. Clauses combine with AND.

use crate::store::{CatalogStore, CatalogView};
use corral_core::types::{Asset, CatalogState};
use corral_core::{CatalogVersion, Error, IndexedTemplate, IndexedVersion, PlatformFilter, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

const MINIMUM_PLATFORM_FIELD: &str = "minimumRancherVersion";
const MAXIMUM_PLATFORM_FIELD: &str = "maximumRancherVersion";

/// Comparison operator of a filter clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Lte,
    Gte,
}

impl FilterOp {
    fn suffix(self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Lte => "lte",
            FilterOp::Gte => "gte",
        }
    }

    fn test(self, equal: bool) -> bool {
        match self {
            FilterOp::Ne => !equal,
            _ => equal,
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Split `field_op` into its field and operator
fn split_filter_name(name: &str) -> (&str, FilterOp) {
    for op in [FilterOp::Eq, FilterOp::Ne, FilterOp::Lte, FilterOp::Gte] {
        if let Some(field) = name
            .strip_suffix(op.suffix())
            .and_then(|rest| rest.strip_suffix('_'))
        {
            return (field, op);
        }
    }
    (name, FilterOp::Eq)
}

fn unsupported(name: &str, field: &str, op: FilterOp) -> Error {
    Error::invalid_filter(name, format!("operator '{}' is not supported for {}", op, field))
}

fn unknown(name: &str) -> Error {
    Error::invalid_filter(name, "unknown filter")
}

/// Fold a platform-range clause into `platform`
///
/// Only `minimumRancherVersion_lte` and `maximumRancherVersion_gte` exist.
/// Returns `Ok(false)` when `field` is not a platform field.
fn apply_platform_clause(
    platform: &mut PlatformFilter,
    name: &str,
    field: &str,
    op: FilterOp,
    value: &str,
) -> Result<bool> {
    let slot = match (field, op) {
        (MINIMUM_PLATFORM_FIELD, FilterOp::Lte) => &mut platform.minimum_lte,
        (MAXIMUM_PLATFORM_FIELD, FilterOp::Gte) => &mut platform.maximum_gte,
        (MINIMUM_PLATFORM_FIELD | MAXIMUM_PLATFORM_FIELD, _) => {
            return Err(unsupported(name, field, op))
        }
        _ => return Ok(false),
    };

    let version = CatalogVersion::parse(value)
        .map_err(|e| Error::invalid_filter(name, e.to_string()))?;
    *slot = Some(version);
    Ok(true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemplateField {
    TemplateBase,
    CatalogId,
    Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplateClause {
    Text {
        field: TemplateField,
        op: FilterOp,
        value: String,
    },
    IsSystem {
        op: FilterOp,
        value: bool,
    },
}

impl TemplateClause {
    fn matches(&self, template: &IndexedTemplate) -> bool {
        match self {
            TemplateClause::Text { field, op, value } => {
                let actual = match field {
                    TemplateField::TemplateBase => Some(template.template_base.as_str()),
                    TemplateField::CatalogId => Some(template.catalog_id.as_str()),
                    TemplateField::Category => template.metadata.category.as_deref(),
                };
                op.test(actual == Some(value.as_str()))
            }
            TemplateClause::IsSystem { op, value } => op.test(template.is_system == *value),
        }
    }
}

/// Filters accepted by template listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateQuery {
    clauses: Vec<TemplateClause>,
    pub platform: PlatformFilter,
}

impl TemplateQuery {
    /// Parse `name=value` filter pairs
    pub fn parse<I, K, V>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = Self::default();

        for (name, value) in params {
            let (name, value) = (name.as_ref(), value.as_ref());
            let (field, op) = split_filter_name(name);

            if apply_platform_clause(&mut query.platform, name, field, op, value)? {
                continue;
            }

            let text_field = match field {
                "templateBase" => Some(TemplateField::TemplateBase),
                "catalogId" => Some(TemplateField::CatalogId),
                "category" => Some(TemplateField::Category),
                "isSystem" => None,
                _ => return Err(unknown(name)),
            };
            if !matches!(op, FilterOp::Eq | FilterOp::Ne) {
                return Err(unsupported(name, field, op));
            }

            let clause = match text_field {
                Some(field) => TemplateClause::Text {
                    field,
                    op,
                    value: value.to_string(),
                },
                None => TemplateClause::IsSystem {
                    op,
                    value: parse_bool(name, value)?,
                },
            };
            query.clauses.push(clause);
        }

        Ok(query)
    }

    /// Whether the template-level clauses accept `template`
    ///
    /// Platform filters apply per version; see [`QueryEngine::list_templates`].
    pub fn matches(&self, template: &IndexedTemplate) -> bool {
        self.clauses.iter().all(|clause| clause.matches(template))
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::invalid_filter(name, "expected true or false")),
    }
}

/// Filters accepted by the version detail endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionQuery {
    pub platform: PlatformFilter,
}

impl VersionQuery {
    pub fn parse<I, K, V>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = Self::default();
        for (name, value) in params {
            let (name, value) = (name.as_ref(), value.as_ref());
            let (field, op) = split_filter_name(name);
            if !apply_platform_clause(&mut query.platform, name, field, op, value)? {
                return Err(unknown(name));
            }
        }
        Ok(query)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CatalogClause {
    Id { op: FilterOp, value: String },
    State { op: FilterOp, value: CatalogState },
}

/// Filters accepted by catalog listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    clauses: Vec<CatalogClause>,
}

impl CatalogQuery {
    pub fn parse<I, K, V>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = Self::default();
        for (name, value) in params {
            let (name, value) = (name.as_ref(), value.as_ref());
            let (field, op) = split_filter_name(name);
            if !matches!(field, "id" | "state") {
                return Err(unknown(name));
            }
            if !matches!(op, FilterOp::Eq | FilterOp::Ne) {
                return Err(unsupported(name, field, op));
            }

            let clause = if field == "id" {
                CatalogClause::Id {
                    op,
                    value: value.to_string(),
                }
            } else {
                let state = value
                    .parse::<CatalogState>()
                    .map_err(|reason| Error::invalid_filter(name, reason))?;
                CatalogClause::State { op, value: state }
            };
            query.clauses.push(clause);
        }
        Ok(query)
    }

    pub fn matches(&self, catalog: &CatalogView) -> bool {
        self.clauses.iter().all(|clause| match clause {
            CatalogClause::Id { op, value } => op.test(catalog.source.id == *value),
            CatalogClause::State { op, value } => op.test(catalog.status.state == *value),
        })
    }
}

/// Identifier of a template (`catalog:name`) or version (`catalog:name:folder`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceId {
    Template {
        catalog: String,
        name: String,
    },
    Version {
        catalog: String,
        name: String,
        folder: String,
    },
}

impl ResourceId {
    /// Split an identifier; anything without two or three non-empty parts
    /// is `NotFound`
    pub fn parse(id: &str) -> Result<Self> {
        let parts: Vec<&str> = id.splitn(3, ':').collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(Error::template_not_found(id));
        }
        match parts.as_slice() {
            [catalog, name] => Ok(ResourceId::Template {
                catalog: catalog.to_string(),
                name: name.to_string(),
            }),
            [catalog, name, folder] => Ok(ResourceId::Version {
                catalog: catalog.to_string(),
                name: name.to_string(),
                folder: folder.to_string(),
            }),
            _ => Err(Error::template_not_found(id)),
        }
    }
}

/// Which attached file of a template or version to serve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Icon,
    Readme,
}

impl AssetKind {
    fn resource(self) -> &'static str {
        match self {
            AssetKind::Icon => "Icon",
            AssetKind::Readme => "README",
        }
    }
}

/// A template with the version links that survived filtering
#[derive(Debug, Clone)]
pub struct TemplateMatch {
    pub template: Arc<IndexedTemplate>,

    /// Version string to version id
    pub version_links: BTreeMap<String, String>,
}

/// One version of a template with its upgrade targets
#[derive(Debug, Clone)]
pub struct VersionDetail {
    pub template: Arc<IndexedTemplate>,
    position: usize,

    /// Version string to version id, strictly greater versions only
    pub upgrade_links: BTreeMap<String, String>,
}

impl VersionDetail {
    pub fn version(&self) -> &IndexedVersion {
        &self.template.versions()[self.position]
    }
}

/// Read-side entry point over the catalog store
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<CatalogStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<CatalogStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    /// Templates of every catalog that match `query`, by catalog then name
    ///
    /// A template with no version left after platform filtering is left
    /// out, as is a template with no versions at all.
    pub fn list_templates(&self, query: &TemplateQuery) -> Vec<TemplateMatch> {
        self.store
            .snapshots()
            .iter()
            .flat_map(|snapshot| snapshot.templates())
            .filter_map(|template| Self::match_template(template, query))
            .collect()
    }

    /// Templates of one catalog that match `query`
    pub fn list_catalog_templates(
        &self,
        catalog_id: &str,
        query: &TemplateQuery,
    ) -> Result<Vec<TemplateMatch>> {
        let snapshot = self.store.snapshot(catalog_id)?;
        Ok(snapshot
            .templates()
            .filter_map(|template| Self::match_template(template, query))
            .collect())
    }

    fn match_template(template: &Arc<IndexedTemplate>, query: &TemplateQuery) -> Option<TemplateMatch> {
        if !query.matches(template) {
            return None;
        }
        let version_links = template.version_links(&query.platform);
        if version_links.is_empty() {
            return None;
        }
        Some(TemplateMatch {
            template: Arc::clone(template),
            version_links,
        })
    }

    /// One template with the version links that pass `query`
    ///
    /// Unlike listings, a template whose versions are all filtered out is
    /// still returned, with empty links.
    pub fn get_template(
        &self,
        catalog_id: &str,
        name: &str,
        query: &VersionQuery,
    ) -> Result<TemplateMatch> {
        let template = self.store.get_template(catalog_id, name)?;
        let version_links = template.version_links(&query.platform);
        Ok(TemplateMatch {
            template,
            version_links,
        })
    }

    /// One version with the upgrade targets that pass `query`
    pub fn version_detail(
        &self,
        catalog_id: &str,
        name: &str,
        folder: &str,
        query: &VersionQuery,
    ) -> Result<VersionDetail> {
        let (template, position) = self.locate_version(catalog_id, name, folder)?;
        let upgrade_links = template.upgrade_links(folder, &query.platform)?;

        Ok(VersionDetail {
            template,
            position,
            upgrade_links,
        })
    }

    /// One version with the strictly greater versions whose `upgrade_from`
    /// admits it
    pub fn upgrade_info(&self, catalog_id: &str, name: &str, folder: &str) -> Result<VersionDetail> {
        let (template, position) = self.locate_version(catalog_id, name, folder)?;
        let upgrade_links = template.upgrade_targets(folder)?;

        Ok(VersionDetail {
            template,
            position,
            upgrade_links,
        })
    }

    /// Icon or README of a template or version
    ///
    /// A version without its own file serves its template's.
    pub fn asset(&self, id: &ResourceId, kind: AssetKind) -> Result<Arc<Asset>> {
        let (found, id) = match id {
            ResourceId::Template { catalog, name } => {
                let template = self.store.get_template(catalog, name)?;
                let found = match kind {
                    AssetKind::Icon => template.icon.clone(),
                    AssetKind::Readme => template.readme.clone(),
                };
                (found, template.id.clone())
            }
            ResourceId::Version {
                catalog,
                name,
                folder,
            } => {
                let (template, position) = self.locate_version(catalog, name, folder)?;
                let version = &template.versions()[position];
                let found = match kind {
                    AssetKind::Icon => version.icon.clone(),
                    AssetKind::Readme => version.readme.clone(),
                };
                (found, version.id.clone())
            }
        };
        found.ok_or_else(|| Error::NotFound {
            resource: kind.resource(),
            id,
        })
    }

    fn locate_version(
        &self,
        catalog_id: &str,
        name: &str,
        folder: &str,
    ) -> Result<(Arc<IndexedTemplate>, usize)> {
        let template = self.store.get_template(catalog_id, name)?;
        let position = template
            .versions()
            .iter()
            .position(|v| v.folder == folder)
            .ok_or_else(|| Error::version_not_found(format!("{}:{}", template.id, folder)))?;
        Ok((template, position))
    }

    /// Catalogs matching `query`, ordered by id
    pub fn list_catalogs(&self, query: &CatalogQuery) -> Vec<CatalogView> {
        self.store
            .list_catalogs()
            .into_iter()
            .filter(|catalog| query.matches(catalog))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs<'a>(items: &'a [(&'a str, &'a str)]) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        items.iter().copied()
    }

    #[test]
    fn test_split_filter_name() {
        assert_eq!(split_filter_name("templateBase"), ("templateBase", FilterOp::Eq));
        assert_eq!(split_filter_name("templateBase_ne"), ("templateBase", FilterOp::Ne));
        assert_eq!(
            split_filter_name("minimumRancherVersion_lte"),
            ("minimumRancherVersion", FilterOp::Lte)
        );
        assert_eq!(split_filter_name("catalogId_eq"), ("catalogId", FilterOp::Eq));
        assert_eq!(split_filter_name("one"), ("one", FilterOp::Eq));
    }

    #[test]
    fn test_template_query_parse() {
        let query = TemplateQuery::parse(pairs(&[
            ("templateBase_eq", "k8s"),
            ("isSystem", "false"),
            ("minimumRancherVersion_lte", "v1.2.0"),
        ]))
        .unwrap();
        assert_eq!(query.clauses.len(), 2);
        assert_eq!(
            query.platform.minimum_lte,
            Some(CatalogVersion::parse("1.2.0").unwrap())
        );
        assert!(query.platform.maximum_gte.is_none());
    }

    #[test]
    fn test_unknown_filter_is_rejected() {
        let err = TemplateQuery::parse(pairs(&[("color", "blue")])).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter { .. }));
    }

    #[test]
    fn test_unsupported_operator_is_rejected() {
        for name in [
            "templateBase_lte",
            "minimumRancherVersion_gte",
            "minimumRancherVersion",
            "maximumRancherVersion_eq",
            "isSystem_gte",
        ] {
            assert!(
                TemplateQuery::parse(pairs(&[(name, "1.0.0")])).is_err(),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_bad_values_are_rejected() {
        assert!(TemplateQuery::parse(pairs(&[("isSystem", "yes")])).is_err());
        assert!(TemplateQuery::parse(pairs(&[("maximumRancherVersion_gte", "latest")])).is_err());
        assert!(CatalogQuery::parse(pairs(&[("state", "paused")])).is_err());
    }

    #[test]
    fn test_version_query_accepts_only_platform_filters() {
        let query = VersionQuery::parse(pairs(&[("maximumRancherVersion_gte", "v1.0.0")])).unwrap();
        assert!(query.platform.maximum_gte.is_some());
        assert!(VersionQuery::parse(pairs(&[("templateBase", "k8s")])).is_err());
    }

    #[test]
    fn test_resource_id_parse() {
        assert_eq!(
            ResourceId::parse("library:nginx").unwrap(),
            ResourceId::Template {
                catalog: "library".to_string(),
                name: "nginx".to_string()
            }
        );
        assert_eq!(
            ResourceId::parse("library:k8s*nginx:2").unwrap(),
            ResourceId::Version {
                catalog: "library".to_string(),
                name: "k8s*nginx".to_string(),
                folder: "2".to_string()
            }
        );
        assert!(ResourceId::parse("abc").unwrap_err().is_not_found());
        assert!(ResourceId::parse("abc:").unwrap_err().is_not_found());
    }
}
