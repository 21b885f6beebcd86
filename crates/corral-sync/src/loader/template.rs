//! Template and version folder loading

use super::compose::{merge_bindings, parse_docker_compose, parse_rancher_compose, scalar_to_string};
use super::{child_dirs, is_hidden, to_utf8, LoadProblem};
use crate::error::{Error, Result};
use camino::Utf8Path;
use corral_core::types::{Asset, TemplateMetadata, TemplateSource, VersionSource};
use serde::Deserialize;
use serde_yaml_ng::Value;
use std::collections::BTreeMap;
use std::fs;
use tracing::{debug, warn};
use walkdir::WalkDir;

const TEMPLATE_CONFIG: &str = "config.yml";
const RANCHER_COMPOSE: &str = "rancher-compose.yml";
const DOCKER_COMPOSE: &str = "docker-compose.yml";
const ICON_PREFIX: &str = "catalogIcon";
const README_PREFIX: &str = "readme";

/// Raw `config.yml`; scalars stay untyped so that numbers and bools in
/// text fields do not fail the whole file
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateConfigFile {
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    category: Option<Value>,
    #[serde(default)]
    description: Option<Value>,
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    maintainer: Option<Value>,
    #[serde(default)]
    license: Option<Value>,
    #[serde(default, rename = "projectURL")]
    project_url: Option<Value>,
    #[serde(default)]
    is_system: Option<Value>,
    #[serde(default)]
    labels: BTreeMap<String, Value>,
}

/// Load one template folder
///
/// Never fails: an unreadable `config.yml` leaves `is_system` unset, and
/// unreadable versions are skipped. Both are recorded in `problems`.
pub fn load_template(dir: &Utf8Path, base: &str, problems: &mut Vec<LoadProblem>) -> TemplateSource {
    let folder = dir.file_name().unwrap_or_default().to_string();
    debug!("Loading template {} from {}", folder, dir);

    let mut template = TemplateSource {
        folder,
        template_base: Some(base.to_string()),
        ..Default::default()
    };

    match read_template_config(dir) {
        Ok(config) => {
            template.metadata = TemplateMetadata {
                name: text(&config.name),
                category: text(&config.category),
                description: text(&config.description),
                default_version: text(&config.version),
                maintainer: text(&config.maintainer),
                license: text(&config.license),
                project_url: text(&config.project_url),
                labels: config
                    .labels
                    .iter()
                    .map(|(k, v)| (k.clone(), scalar_to_string(v).unwrap_or_default()))
                    .collect(),
            };
            match parse_is_system(config.is_system.as_ref()) {
                Some(is_system) => template.is_system = Some(is_system),
                None => problems.push(LoadProblem::new(
                    dir.join(TEMPLATE_CONFIG),
                    "isSystem must be true or false",
                )),
            }
        }
        Err(e) => {
            warn!("Template {}: {}", dir, e);
            problems.push(LoadProblem::new(dir.join(TEMPLATE_CONFIG), e.to_string()));
        }
    }

    match read_assets(dir) {
        Ok((icon, readme)) => {
            template.icon = icon;
            template.readme = readme;
        }
        Err(e) => problems.push(LoadProblem::new(dir, e.to_string())),
    }

    let version_dirs = match child_dirs(dir) {
        Ok(dirs) => dirs,
        Err(e) => {
            problems.push(LoadProblem::new(dir, e.to_string()));
            Vec::new()
        }
    };

    for version_dir in version_dirs {
        match load_version(&version_dir) {
            Ok(version) => template.versions.push(version),
            Err(e) => {
                warn!("Skipping version folder {}: {}", version_dir, e);
                problems.push(LoadProblem::new(version_dir, e.to_string()));
            }
        }
    }

    template
}

/// Load one version folder
pub fn load_version(dir: &Utf8Path) -> Result<VersionSource> {
    let compose_path = dir.join(RANCHER_COMPOSE);
    if !compose_path.is_file() {
        return Err(Error::missing_file(compose_path.as_str()));
    }

    let compose = parse_rancher_compose(&fs::read_to_string(&compose_path)?)?;

    let docker_path = dir.join(DOCKER_COMPOSE);
    let docker = if docker_path.is_file() {
        parse_docker_compose(&fs::read_to_string(&docker_path)?)?
    } else {
        BTreeMap::new()
    };

    let (icon, readme) = read_assets(dir)?;

    Ok(VersionSource {
        folder: dir.file_name().unwrap_or_default().to_string(),
        version: compose.version.unwrap_or_default(),
        name: compose.name,
        description: compose.description,
        minimum_platform_version: compose.minimum_rancher_version,
        maximum_platform_version: compose.maximum_rancher_version,
        upgrade_from: compose.upgrade_from,
        files: read_files(dir)?,
        bindings: merge_bindings(&compose.scales, docker),
        questions: compose.questions,
        icon,
        readme,
    })
}

fn read_template_config(dir: &Utf8Path) -> Result<TemplateConfigFile> {
    let path = dir.join(TEMPLATE_CONFIG);
    if !path.is_file() {
        return Err(Error::missing_file(path.as_str()));
    }
    let content = fs::read_to_string(&path)?;
    if content.trim().is_empty() {
        return Ok(TemplateConfigFile::default());
    }
    Ok(serde_yaml_ng::from_str(&content)?)
}

/// Absent or null means false; anything but a boolean or "true"/"false" is rejected
fn parse_is_system(value: Option<&Value>) -> Option<bool> {
    match value {
        None | Some(Value::Null) => Some(false),
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" | "" => Some(false),
            _ => None,
        },
        Some(_) => None,
    }
}

fn text(value: &Option<Value>) -> Option<String> {
    value.as_ref().and_then(scalar_to_string)
}

fn is_icon(name: &str) -> bool {
    name.starts_with(ICON_PREFIX)
}

fn is_readme(name: &str) -> bool {
    name.to_ascii_lowercase().starts_with(README_PREFIX)
}

/// Icon and README at the top of `dir`; the first by file name wins
fn read_assets(dir: &Utf8Path) -> Result<(Option<Asset>, Option<Asset>)> {
    let mut icon = None;
    let mut readme = None;

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        let slot = if is_icon(name) {
            &mut icon
        } else if is_readme(name) {
            &mut readme
        } else {
            continue;
        };
        if slot.is_none() {
            *slot = Some(Asset {
                file_name: name.to_string(),
                content: fs::read(entry.path())?,
            });
        }
    }

    Ok((icon, readme))
}

/// Every non-hidden file under `dir`, keyed by its `/`-separated relative
/// path; the top-level icon and README are left out
fn read_files(dir: &Utf8Path) -> Result<BTreeMap<String, String>> {
    let mut files = BTreeMap::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e.file_name()))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.depth() == 1
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| is_icon(name) || is_readme(name))
        {
            continue;
        }
        let path = to_utf8(entry.into_path())?;
        let relative = path
            .strip_prefix(dir)
            .map_err(|_| Error::invalid_path(path.as_str()))?;
        let key = relative
            .components()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join("/");

        let bytes = fs::read(&path)?;
        files.insert(key, String::from_utf8_lossy(&bytes).into_owned());
    }

    Ok(files)
}
