//! Per-catalog template index
//!
//! A [`CatalogSnapshot`] is built in one pass from the parsed template tree
//! of a catalog and is immutable afterwards. Problems found while building
//! are returned as [`BuildIssue`]s; a broken template is left out of the
//! snapshot without affecting its siblings, and a broken version stays
//! addressable but never takes part in upgrade computation.
//!
//! A version declaring `upgrade_from` is an upgrade target only for
//! installed versions inside that range; an unparsable range makes the
//! version a target for none.

use crate::compatibility::{CompatibilityRange, PlatformFilter};
use crate::error::{Error, Result};
use crate::types::{
    Asset, Question, ServiceBinding, TemplateMetadata, TemplateSource, VersionSource,
};
use crate::upgrade::UpgradeRange;
use crate::version::CatalogVersion;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Problem found while indexing a catalog
#[derive(Debug)]
pub struct BuildIssue {
    /// Identifier of the template the problem belongs to
    pub template: String,
    pub error: Error,
}

impl BuildIssue {
    fn new(template: &str, error: Error) -> Self {
        Self {
            template: template.to_string(),
            error,
        }
    }

    /// Whether the template was left out of the snapshot
    pub fn drops_template(&self) -> bool {
        matches!(self.error, Error::MissingField { .. })
    }
}

/// A template version after indexing
#[derive(Debug, Clone)]
pub struct IndexedVersion {
    /// `<catalogId>:<templateName>:<folder>`
    pub id: String,
    pub folder: String,
    pub version: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub minimum_platform_version: Option<String>,
    pub maximum_platform_version: Option<String>,
    pub upgrade_from: Option<String>,
    pub files: BTreeMap<String, String>,
    pub bindings: BTreeMap<String, ServiceBinding>,
    pub questions: Vec<Question>,

    /// Own icon, or the template's when the version ships none
    pub icon: Option<Arc<Asset>>,

    /// Own README, or the template's when the version ships none
    pub readme: Option<Arc<Asset>>,

    ordering: Option<CatalogVersion>,
    compatibility: Option<CompatibilityRange>,
    upgrade_range: Option<UpgradeRange>,
}

impl IndexedVersion {
    /// Parsed version, `None` when the version string is malformed
    pub fn ordering(&self) -> Option<&CatalogVersion> {
        self.ordering.as_ref()
    }

    /// Declared platform range, `None` when a declared bound is malformed
    pub fn compatibility(&self) -> Option<&CompatibilityRange> {
        self.compatibility.as_ref()
    }

    /// Whether an installation at `installed` may upgrade to this version
    pub fn accepts_upgrade_from(&self, installed: &CatalogVersion) -> bool {
        self.upgrade_range
            .as_ref()
            .is_none_or(|range| range.admits(installed))
    }
}

/// A template after indexing
#[derive(Debug, Clone)]
pub struct IndexedTemplate {
    /// `<catalogId>:<templateName>`
    pub id: String,
    pub catalog_id: String,

    /// Template name used in identifiers (`<base>*<folder>` or `<folder>`)
    pub name: String,
    pub folder: String,
    pub template_base: String,
    pub is_system: bool,
    pub metadata: TemplateMetadata,
    pub icon: Option<Arc<Asset>>,
    pub readme: Option<Arc<Asset>>,

    /// Well-formed versions in ascending order, then malformed ones by folder
    versions: Vec<IndexedVersion>,
    ordered: usize,
}

impl IndexedTemplate {
    pub fn versions(&self) -> &[IndexedVersion] {
        &self.versions
    }

    /// Look up a version by its folder name
    pub fn version(&self, folder: &str) -> Option<&IndexedVersion> {
        self.versions.iter().find(|v| v.folder == folder)
    }

    /// Version string to version id for every version passing `filter`
    ///
    /// When two folders declare the same string, the first in index order
    /// owns the key.
    pub fn version_links(&self, filter: &PlatformFilter) -> BTreeMap<String, String> {
        let mut links = BTreeMap::new();
        for version in &self.versions {
            if filter.admits(version.compatibility()) {
                links
                    .entry(version.version.clone())
                    .or_insert_with(|| version.id.clone());
            }
        }
        links
    }

    /// Version string to version id for every version strictly greater
    /// than the one in `folder` that passes `filter`
    pub fn upgrade_links(
        &self,
        folder: &str,
        filter: &PlatformFilter,
    ) -> Result<BTreeMap<String, String>> {
        self.greater_versions(folder, |_, candidate| {
            filter.admits(candidate.compatibility())
        })
    }

    /// Version string to version id for every strictly greater version
    /// whose `upgrade_from` admits the one in `folder`
    pub fn upgrade_targets(&self, folder: &str) -> Result<BTreeMap<String, String>> {
        self.greater_versions(folder, |installed, candidate| {
            candidate.accepts_upgrade_from(installed)
        })
    }

    fn greater_versions<F>(&self, folder: &str, keep: F) -> Result<BTreeMap<String, String>>
    where
        F: Fn(&CatalogVersion, &IndexedVersion) -> bool,
    {
        let position = self
            .versions
            .iter()
            .position(|v| v.folder == folder)
            .ok_or_else(|| Error::version_not_found(format!("{}:{}", self.id, folder)))?;

        let mut links = BTreeMap::new();
        if position >= self.ordered {
            return Ok(links);
        }
        let Some(anchor) = self.versions[position].ordering.as_ref() else {
            return Ok(links);
        };

        for candidate in &self.versions[position + 1..self.ordered] {
            let greater = candidate.ordering.as_ref().is_some_and(|v| v > anchor);
            if greater && keep(anchor, candidate) {
                links
                    .entry(candidate.version.clone())
                    .or_insert_with(|| candidate.id.clone());
            }
        }
        Ok(links)
    }

    fn build(catalog_id: &str, source: TemplateSource, issues: &mut Vec<BuildIssue>) -> Result<Self> {
        let name = source.qualified_name();
        let id = format!("{}:{}", catalog_id, name);

        let template_base = source
            .template_base
            .ok_or_else(|| Error::missing_field(&id, "templateBase"))?;
        let is_system = source
            .is_system
            .ok_or_else(|| Error::missing_field(&id, "isSystem"))?;

        let icon = source.icon.map(Arc::new);
        let readme = source.readme.map(Arc::new);

        let mut ordered = Vec::new();
        let mut malformed = Vec::new();
        for version in source.versions {
            let mut indexed = index_version(&id, version, issues);
            if indexed.icon.is_none() {
                indexed.icon = icon.clone();
            }
            if indexed.readme.is_none() {
                indexed.readme = readme.clone();
            }
            if indexed.ordering.is_some() {
                ordered.push(indexed);
            } else {
                malformed.push(indexed);
            }
        }

        ordered.sort_by(|a, b| {
            a.ordering
                .cmp(&b.ordering)
                .then_with(|| a.folder.cmp(&b.folder))
        });
        malformed.sort_by(|a, b| a.folder.cmp(&b.folder));

        for pair in ordered.windows(2) {
            if pair[0].ordering.cmp(&pair[1].ordering) == Ordering::Equal {
                issues.push(BuildIssue::new(
                    &id,
                    Error::duplicate_version(&id, &pair[0].version, &pair[1].version),
                ));
            }
        }

        let ordered_len = ordered.len();
        let mut versions = ordered;
        versions.extend(malformed);

        Ok(Self {
            id,
            catalog_id: catalog_id.to_string(),
            name,
            folder: source.folder,
            template_base,
            is_system,
            metadata: source.metadata,
            icon,
            readme,
            versions,
            ordered: ordered_len,
        })
    }
}

fn index_version(
    template_id: &str,
    source: VersionSource,
    issues: &mut Vec<BuildIssue>,
) -> IndexedVersion {
    let ordering = match CatalogVersion::parse(&source.version) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            issues.push(BuildIssue::new(template_id, e));
            None
        }
    };

    let compatibility = match CompatibilityRange::from_bounds(
        source.minimum_platform_version.as_deref(),
        source.maximum_platform_version.as_deref(),
    ) {
        Ok(range) => Some(range),
        Err(e) => {
            issues.push(BuildIssue::new(template_id, e));
            None
        }
    };

    let upgrade_range = match source.upgrade_from.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(range) => Some(UpgradeRange::parse(range).unwrap_or_else(|e| {
            issues.push(BuildIssue::new(template_id, e));
            UpgradeRange::nothing()
        })),
    };

    IndexedVersion {
        id: format!("{}:{}", template_id, source.folder),
        folder: source.folder,
        version: source.version,
        name: source.name,
        description: source.description,
        minimum_platform_version: source.minimum_platform_version,
        maximum_platform_version: source.maximum_platform_version,
        upgrade_from: source.upgrade_from,
        files: source.files,
        bindings: source.bindings,
        questions: source.questions,
        icon: source.icon.map(Arc::new),
        readme: source.readme.map(Arc::new),
        ordering,
        compatibility,
        upgrade_range,
    }
}

/// Immutable index of one catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    catalog_id: String,
    templates: BTreeMap<String, Arc<IndexedTemplate>>,
}

impl CatalogSnapshot {
    /// Snapshot with no templates, published before the first refresh
    pub fn empty(catalog_id: impl Into<String>) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            templates: BTreeMap::new(),
        }
    }

    /// Index a parsed template tree
    pub fn build(catalog_id: &str, sources: Vec<TemplateSource>) -> (Self, Vec<BuildIssue>) {
        let mut issues = Vec::new();
        let mut templates = BTreeMap::new();

        for source in sources {
            let name = source.qualified_name();
            match IndexedTemplate::build(catalog_id, source, &mut issues) {
                Ok(template) => {
                    templates.insert(template.name.clone(), Arc::new(template));
                }
                Err(e) => issues.push(BuildIssue::new(&format!("{}:{}", catalog_id, name), e)),
            }
        }

        (
            Self {
                catalog_id: catalog_id.to_string(),
                templates,
            },
            issues,
        )
    }

    pub fn catalog_id(&self) -> &str {
        &self.catalog_id
    }

    /// Look up a template by its name (the part of the id after the catalog)
    pub fn template(&self, name: &str) -> Option<&Arc<IndexedTemplate>> {
        self.templates.get(name)
    }

    /// Templates ordered by name
    pub fn templates(&self) -> impl Iterator<Item = &Arc<IndexedTemplate>> {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn version(folder: &str, version: &str) -> VersionSource {
        VersionSource {
            folder: folder.to_string(),
            version: version.to_string(),
            ..Default::default()
        }
    }

    fn template(folder: &str, versions: &[&str]) -> TemplateSource {
        TemplateSource {
            folder: folder.to_string(),
            template_base: Some(String::new()),
            is_system: Some(false),
            metadata: TemplateMetadata::default(),
            icon: None,
            readme: None,
            versions: versions
                .iter()
                .enumerate()
                .map(|(i, v)| version(&i.to_string(), v))
                .collect(),
        }
    }

    fn build_one(source: TemplateSource) -> (Arc<IndexedTemplate>, Vec<BuildIssue>) {
        let name = source.qualified_name();
        let (snapshot, issues) = CatalogSnapshot::build("library", vec![source]);
        (snapshot.template(&name).unwrap().clone(), issues)
    }

    fn folder_of(template: &IndexedTemplate, version: &str) -> String {
        template
            .versions()
            .iter()
            .find(|v| v.version == version)
            .unwrap()
            .folder
            .clone()
    }

    const THIRTEEN: &[&str] = &[
        "1.0.0",
        "1.0.1",
        "1.0.2",
        "1.0.3",
        "1.0.11",
        "1.1.0",
        "1.2.0",
        "1.10.0",
        "1.10.1",
        "2.0.0-alpha1",
        "2.0.0-alpha2",
        "2.0.0-beta1",
        "2.0.0",
    ];

    #[test]
    fn test_lowest_version_upgrades_to_all_others() {
        let (template, issues) = build_one(template("many", THIRTEEN));
        assert!(issues.is_empty());

        let links = template
            .upgrade_links(&folder_of(&template, "1.0.0"), &PlatformFilter::default())
            .unwrap();
        assert_eq!(links.len(), 12);
        assert!(!links.contains_key("1.0.0"));
    }

    #[test]
    fn test_listed_thirteen_versions() {
        let listed = [
            "1.0.0",
            "1.0.1",
            "1.0.2",
            "1.0.3",
            "1.0.11",
            "1.1.0",
            "1.1.1",
            "1.2.0",
            "1.2.1",
            "2.0.0-alpha1",
            "2.0.0-alpha2",
            "2.0.0-beta1",
            "2.0.0",
        ];
        let (template, issues) = build_one(template("listed", &listed));
        assert!(issues.is_empty());
        let filter = PlatformFilter::default();

        let from_lowest = template
            .upgrade_links(&folder_of(&template, "1.0.0"), &filter)
            .unwrap();
        let expected: BTreeSet<&str> = listed[1..].iter().copied().collect();
        assert_eq!(
            from_lowest.keys().map(String::as_str).collect::<BTreeSet<_>>(),
            expected
        );

        let from_alpha = template
            .upgrade_links(&folder_of(&template, "2.0.0-alpha1"), &filter)
            .unwrap();
        assert_eq!(
            from_alpha.keys().map(String::as_str).collect::<BTreeSet<_>>(),
            BTreeSet::from(["2.0.0-alpha2", "2.0.0-beta1", "2.0.0"])
        );
    }

    #[test]
    fn test_prerelease_upgrades() {
        let (template, _) = build_one(template("many", THIRTEEN));
        let links = template
            .upgrade_links(&folder_of(&template, "2.0.0-alpha1"), &PlatformFilter::default())
            .unwrap();

        let keys: Vec<&str> = links.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["2.0.0", "2.0.0-alpha2", "2.0.0-beta1"]);
    }

    #[test]
    fn test_highest_version_has_no_upgrades() {
        let (template, _) = build_one(template("many", THIRTEEN));
        let links = template
            .upgrade_links(&folder_of(&template, "2.0.0"), &PlatformFilter::default())
            .unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn test_upgrade_count_matches_greater_count() {
        let (template, _) = build_one(template("many", THIRTEEN));
        for anchor in template.versions() {
            let anchor_version = anchor.ordering().unwrap();
            let greater = template
                .versions()
                .iter()
                .filter(|v| v.ordering().unwrap() > anchor_version)
                .count();
            let links = template
                .upgrade_links(&anchor.folder, &PlatformFilter::default())
                .unwrap();
            assert_eq!(links.len(), greater, "anchor {}", anchor.version);
            assert!(!links.contains_key(&anchor.version));
        }
    }

    #[test]
    fn test_upgrades_are_one_directional() {
        let (template, _) = build_one(template("pair", &["1.0.0", "1.1.0"]));
        let filter = PlatformFilter::default();

        let low = template.upgrade_links("0", &filter).unwrap();
        let high = template.upgrade_links("1", &filter).unwrap();
        assert!(low.contains_key("1.1.0"));
        assert!(!high.contains_key("1.0.0"));
    }

    #[test]
    fn test_version_link_keys() {
        let (template, _) = build_one(template("four", &["3.0.0", "1.0.0", "4.0.0", "2.0.0"]));
        let keys: Vec<String> = template
            .version_links(&PlatformFilter::default())
            .into_keys()
            .collect();
        assert_eq!(keys, vec!["1.0.0", "2.0.0", "3.0.0", "4.0.0"]);
    }

    #[test]
    fn test_single_version_has_empty_upgrades() {
        let (template, _) = build_one(template("solo", &["0.1.0"]));
        assert!(template
            .upgrade_links("0", &PlatformFilter::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_malformed_version_is_addressable_but_excluded() {
        let (template, issues) = build_one(template("odd", &["1.0.0", "latest", "2.0.0"]));

        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0].error, Error::MalformedVersion { .. }));
        assert!(!issues[0].drops_template());

        let malformed = template.version("1").unwrap();
        assert_eq!(malformed.version, "latest");
        assert!(malformed.ordering().is_none());

        let filter = PlatformFilter::default();
        assert!(template.upgrade_links("1", &filter).unwrap().is_empty());
        let from_low = template.upgrade_links("0", &filter).unwrap();
        assert_eq!(from_low.keys().collect::<Vec<_>>(), vec!["2.0.0"]);
        assert!(template.version_links(&filter).contains_key("latest"));
    }

    #[test]
    fn test_duplicate_versions_are_reported() {
        let (template, issues) = build_one(template("dup", &["v1.0.0", "1.0.0", "1.1.0"]));

        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0].error, Error::DuplicateVersion { .. }));
        assert_eq!(template.versions().len(), 3);

        let links = template.upgrade_links("0", &PlatformFilter::default()).unwrap();
        assert_eq!(links.keys().collect::<Vec<_>>(), vec!["1.1.0"]);
    }

    #[test]
    fn test_equal_spellings_are_duplicates() {
        let (template, issues) = build_one(template(
            "spellings",
            &["1.0.0", "1.0.0+build.7", "1.0.0.0", "1.1.0"],
        ));

        let duplicates = issues
            .iter()
            .filter(|issue| matches!(issue.error, Error::DuplicateVersion { .. }))
            .count();
        assert_eq!(duplicates, 2);

        let filter = PlatformFilter::default();
        for folder in ["0", "1", "2"] {
            let links = template.upgrade_links(folder, &filter).unwrap();
            assert_eq!(links.keys().collect::<Vec<_>>(), vec!["1.1.0"]);
        }
    }

    fn ranged(ranges: &[(&str, Option<&str>)]) -> TemplateSource {
        let versions: Vec<&str> = ranges.iter().map(|(v, _)| *v).collect();
        let mut source = template("ranged", &versions);
        for (version, (_, range)) in source.versions.iter_mut().zip(ranges) {
            version.upgrade_from = range.map(str::to_string);
        }
        source
    }

    #[test]
    fn test_upgrade_targets_honor_upgrade_from() {
        let (template, issues) = build_one(ranged(&[
            ("1.0.0", None),
            ("1.1.0", Some(">=1.0.0")),
            ("2.0.0", Some(">=1.1.0 <2.0.0")),
            ("2.1.0", Some("")),
        ]));
        assert!(issues.is_empty());

        let from_first = template.upgrade_targets("0").unwrap();
        assert_eq!(from_first.keys().collect::<Vec<_>>(), vec!["1.1.0", "2.1.0"]);

        let from_second = template.upgrade_targets("1").unwrap();
        assert_eq!(from_second.keys().collect::<Vec<_>>(), vec!["2.0.0", "2.1.0"]);

        // version links ignore upgrade_from
        let links = template.upgrade_links("0", &PlatformFilter::default()).unwrap();
        assert_eq!(links.len(), 3);
    }

    #[test]
    fn test_unparsable_upgrade_from_is_never_a_target() {
        let (template, issues) = build_one(ranged(&[
            ("1.0.0", None),
            ("1.1.0", Some("~>1.0")),
            ("1.2.0", None),
        ]));
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0].error, Error::InvalidUpgradeRange { .. }));
        assert!(!issues[0].drops_template());

        let targets = template.upgrade_targets("0").unwrap();
        assert_eq!(targets.keys().collect::<Vec<_>>(), vec!["1.2.0"]);
    }

    #[test]
    fn test_versions_fall_back_to_template_assets() {
        let asset = |name: &str, bytes: &[u8]| Asset {
            file_name: name.to_string(),
            content: bytes.to_vec(),
        };
        let mut source = template("assets", &["1.0.0", "1.1.0"]);
        source.icon = Some(asset("catalogIcon.svg", b"<svg/>"));
        source.versions[1].icon = Some(asset("catalogIcon.png", &[0x89, b'P', b'N', b'G']));
        source.versions[1].readme = Some(asset("README.md", b"# 1.1.0"));

        let (template, _) = build_one(source);
        assert_eq!(template.icon.as_ref().unwrap().file_name, "catalogIcon.svg");
        assert!(template.readme.is_none());

        let first = template.version("0").unwrap();
        assert_eq!(first.icon.as_ref().unwrap().file_name, "catalogIcon.svg");
        assert!(first.readme.is_none());

        let second = template.version("1").unwrap();
        assert_eq!(second.icon.as_ref().unwrap().content, vec![0x89, b'P', b'N', b'G']);
        assert_eq!(second.readme.as_ref().unwrap().content, b"# 1.1.0".to_vec());
    }

    #[test]
    fn test_missing_is_system_drops_only_that_template() {
        let mut broken = template("broken", &["1.0.0"]);
        broken.is_system = None;
        let healthy = template("healthy", &["1.0.0"]);

        let (snapshot, issues) = CatalogSnapshot::build("library", vec![broken, healthy]);
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.template("healthy").is_some());
        assert!(snapshot.template("broken").is_none());

        assert_eq!(issues.len(), 1);
        assert!(issues[0].drops_template());
        assert_eq!(issues[0].template, "library:broken");
    }

    #[test]
    fn test_template_ids_include_base() {
        let mut based = template("nginx", &["1.0.0"]);
        based.template_base = Some("k8s".to_string());

        let (snapshot, _) = CatalogSnapshot::build("community", vec![based]);
        let indexed = snapshot.template("k8s*nginx").unwrap();
        assert_eq!(indexed.id, "community:k8s*nginx");
        assert_eq!(indexed.template_base, "k8s");
        assert_eq!(indexed.versions()[0].id, "community:k8s*nginx:0");
    }

    #[test]
    fn test_upgrade_links_respect_platform_filter() {
        let mut source = template("ranged", &["1.0.0", "1.1.0", "1.2.0"]);
        source.versions[1].minimum_platform_version = Some("v0.46.0".to_string());
        source.versions[2].minimum_platform_version = Some("v0.50.0".to_string());

        let (template, _) = build_one(source);
        let filter = PlatformFilter {
            minimum_lte: Some(CatalogVersion::parse("v0.47.0").unwrap()),
            ..Default::default()
        };
        let links = template.upgrade_links("0", &filter).unwrap();
        assert_eq!(links.keys().collect::<Vec<_>>(), vec!["1.1.0"]);

        let listed = template.version_links(&filter);
        assert_eq!(listed.keys().collect::<Vec<_>>(), vec!["1.0.0", "1.1.0"]);
    }

    #[test]
    fn test_malformed_bound_excluded_only_under_filter() {
        let mut source = template("bounds", &["1.0.0", "1.1.0"]);
        source.versions[1].maximum_platform_version = Some("someday".to_string());

        let (template, issues) = build_one(source);
        assert_eq!(issues.len(), 1);
        assert!(template.version("1").unwrap().compatibility().is_none());

        let unfiltered = template.upgrade_links("0", &PlatformFilter::default()).unwrap();
        assert!(unfiltered.contains_key("1.1.0"));

        let filter = PlatformFilter {
            maximum_gte: Some(CatalogVersion::parse("1.0.0").unwrap()),
            ..Default::default()
        };
        assert!(template.upgrade_links("0", &filter).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_folder_is_not_found() {
        let (template, _) = build_one(template("x", &["1.0.0"]));
        let err = template
            .upgrade_links("9", &PlatformFilter::default())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let first = CatalogSnapshot::build("library", vec![template("many", THIRTEEN)]).0;
        let second = CatalogSnapshot::build("library", vec![template("many", THIRTEEN)]).0;

        let a = first.template("many").unwrap();
        let b = second.template("many").unwrap();
        let filter = PlatformFilter::default();
        assert_eq!(a.version_links(&filter), b.version_links(&filter));
        for version in a.versions() {
            assert_eq!(
                a.upgrade_links(&version.folder, &filter).unwrap(),
                b.upgrade_links(&version.folder, &filter).unwrap()
            );
        }
    }
}
