//! Catalog configuration from files and command-line values

use crate::error::{Error, Result};
use crate::types::{CatalogSource, DEFAULT_BRANCH};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use tracing::debug;

/// Catalog id given to a URL passed without an `id=` prefix
pub const DEFAULT_CATALOG_ID: &str = "library";

/// One configured catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub url: String,

    #[serde(default = "default_branch")]
    pub branch: String,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

/// Configured catalogs, keyed by catalog id
///
/// The file form is YAML or JSON:
///
/// ```yaml
/// catalogs:
///   library:
///     url: https://github.com/example/catalog.git
///     branch: master
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub catalogs: BTreeMap<String, CatalogConfig>,
}

impl ServiceConfig {
    /// Load configuration from a file
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config_not_found(path.as_str())
            } else {
                Error::Io(e)
            }
        })?;

        let config = Self::parse(&content)?;
        debug!(
            "Loaded {} catalog(s) from {}",
            config.catalogs.len(),
            path
        );
        Ok(config)
    }

    /// Parse configuration text; JSON is accepted as a subset of YAML
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: ServiceConfig = serde_yaml_ng::from_str(content)?;
        for (id, catalog) in config.catalogs.iter_mut() {
            validate_id(id)?;
            if catalog.url.trim().is_empty() {
                return Err(Error::invalid_config(format!(
                    "catalog '{}' has an empty url",
                    id
                )));
            }
            catalog.url = normalize_url(catalog.url.trim());
        }
        Ok(config)
    }

    /// Parse `--catalog-url` values
    ///
    /// Each value may hold several comma-separated entries. An entry is
    /// either `id=url` or a bare `url`; a bare url is registered as
    /// [`DEFAULT_CATALOG_ID`] and may appear only once.
    pub fn from_catalog_args<S: AsRef<str>>(values: &[S]) -> Result<Self> {
        let mut catalogs = BTreeMap::new();
        let mut bare_seen = false;

        for entry in values
            .iter()
            .flat_map(|value| value.as_ref().split(','))
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
        {
            let (id, url) = match split_catalog_entry(entry) {
                Some((id, url)) => (id.trim().to_string(), url.trim()),
                None => {
                    if bare_seen {
                        return Err(Error::invalid_config(
                            "only one catalog url may be given without an id",
                        ));
                    }
                    bare_seen = true;
                    (DEFAULT_CATALOG_ID.to_string(), entry)
                }
            };

            validate_id(&id)?;
            if url.is_empty() {
                return Err(Error::invalid_config(format!(
                    "catalog '{}' has an empty url",
                    id
                )));
            }

            catalogs.insert(
                id,
                CatalogConfig {
                    url: normalize_url(url),
                    branch: default_branch(),
                },
            );
        }

        Ok(Self { catalogs })
    }

    /// Merge another configuration into this one; entries of `other` win
    pub fn merge(&mut self, other: ServiceConfig) {
        self.catalogs.extend(other.catalogs);
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }

    /// Catalog sources in id order
    pub fn sources(&self) -> Vec<CatalogSource> {
        self.catalogs
            .iter()
            .map(|(id, catalog)| CatalogSource::new(id, &catalog.url, &catalog.branch))
            .collect()
    }
}

/// Split `id=url`, ignoring `=` that belongs to the url itself
fn split_catalog_entry(entry: &str) -> Option<(&str, &str)> {
    let (id, url) = entry.split_once('=')?;
    if id.contains("://") || id.contains('/') || id.contains('@') {
        return None;
    }
    Some((id, url))
}

/// Catalog ids name a checkout directory under the catalog root, so only
/// ASCII letters, digits, `-` and `_` are allowed
fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::invalid_config("catalog id must not be empty"));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::invalid_config(format!(
            "catalog id '{}' may only contain letters, digits, '-' and '_'",
            id
        )));
    }
    Ok(())
}

/// Lower-case the scheme of a url (`Https://host` becomes `https://host`)
pub fn normalize_url(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => format!("{}://{}", scheme.to_lowercase(), rest),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_bare_url_becomes_library() {
        let config = ServiceConfig::from_catalog_args(&["https://example.com/catalog.git"]).unwrap();
        let library = config.catalogs.get(DEFAULT_CATALOG_ID).unwrap();
        assert_eq!(library.url, "https://example.com/catalog.git");
        assert_eq!(library.branch, "master");
    }

    #[test]
    fn test_named_and_comma_separated_entries() {
        let config = ServiceConfig::from_catalog_args(&[
            "community=https://example.com/community.git,qa=/srv/qa-catalog",
            "Https://example.com/library.git",
        ])
        .unwrap();

        let ids: Vec<&str> = config.catalogs.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["community", "library", "qa"]);
        assert_eq!(config.catalogs["qa"].url, "/srv/qa-catalog");
        assert_eq!(
            config.catalogs["library"].url,
            "https://example.com/library.git"
        );
    }

    #[test]
    fn test_second_bare_url_is_rejected() {
        let err = ServiceConfig::from_catalog_args(&["https://a.example/x", "https://b.example/y"])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_query_string_equals_is_not_an_id() {
        let config =
            ServiceConfig::from_catalog_args(&["https://example.com/repo.git?ref=main"]).unwrap();
        assert_eq!(
            config.catalogs[DEFAULT_CATALOG_ID].url,
            "https://example.com/repo.git?ref=main"
        );
    }

    #[test]
    fn test_id_with_colon_is_rejected() {
        assert!(ServiceConfig::from_catalog_args(&["a:b=https://example.com/x"]).is_err());
    }

    #[test]
    fn test_path_like_ids_are_rejected() {
        for id in ["..", ".", ".hidden", "a\\b", "a b", "lib.old"] {
            let entry = format!("{}=/srv/catalog", id);
            let err = ServiceConfig::from_catalog_args(&[entry.as_str()]).unwrap_err();
            assert!(matches!(err, Error::InvalidConfig { .. }), "id {:?} accepted", id);
        }
        assert!(ServiceConfig::parse("catalogs:\n  \"..\":\n    url: /srv/catalog\n").is_err());
        assert!(ServiceConfig::from_catalog_args(&["my-catalog_2=/srv/catalog"]).is_ok());
    }

    #[test]
    fn test_load_json_file() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("catalogs.json")).unwrap();
        fs::write(
            &path,
            r#"{"catalogs": {"library": {"url": "HTTPS://example.com/lib.git", "branch": "stable"},
                             "extra": {"url": "https://example.com/extra.git"}}}"#,
        )
        .unwrap();

        let config = ServiceConfig::load(&path).unwrap();
        assert_eq!(config.catalogs["library"].url, "https://example.com/lib.git");
        assert_eq!(config.catalogs["library"].branch, "stable");
        assert_eq!(config.catalogs["extra"].branch, "master");
    }

    #[test]
    fn test_load_missing_file() {
        let err = ServiceConfig::load(Utf8Path::new("/nonexistent/corral.yaml")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base = ServiceConfig::from_catalog_args(&["library=https://a.example/x"]).unwrap();
        let file = ServiceConfig::parse(
            "catalogs:\n  library:\n    url: https://b.example/y\n    branch: dev\n",
        )
        .unwrap();
        base.merge(file);

        let sources = base.sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].uri, "https://b.example/y");
        assert_eq!(sources[0].branch, "dev");
    }
}
