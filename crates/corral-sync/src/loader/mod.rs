//! Catalog checkout to parsed template tree
//!
//! A catalog repository keeps its templates in `templates/<name>` or
//! `<base>-templates/<name>`. Each template folder has a `config.yml` and
//! one sub-folder per version, each holding a `rancher-compose.yml`.
//!
//! Problems in one template or version are collected as [`LoadProblem`]s
//! and never stop the rest of the catalog from loading.

mod compose;
mod template;

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use corral_core::types::TemplateSource;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, info};
use walkdir::WalkDir;

pub use compose::{parse_docker_compose, parse_rancher_compose, RancherCompose};
pub use template::{load_template, load_version};

static TEMPLATES_DIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\w+)-)?templates$").expect("templates dir regex is valid")
});

/// Parsed contents of one catalog checkout
#[derive(Debug, Default)]
pub struct CatalogTree {
    pub templates: Vec<TemplateSource>,
    pub problems: Vec<LoadProblem>,
}

/// A template or version folder that could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadProblem {
    pub path: Utf8PathBuf,
    pub message: String,
}

impl LoadProblem {
    pub fn new(path: impl Into<Utf8PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LoadProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Load every template of the catalog checked out at `root`
pub fn load_catalog(root: &Utf8Path) -> Result<CatalogTree> {
    if !root.is_dir() {
        return Err(Error::catalog_dir_not_found(root.as_str()));
    }

    let mut tree = CatalogTree::default();

    for templates_dir in child_dirs(root)? {
        let Some(name) = templates_dir.file_name() else {
            continue;
        };
        let Some(captures) = TEMPLATES_DIR_RE.captures(name) else {
            continue;
        };
        let base = captures.get(1).map_or("", |m| m.as_str());
        debug!("Reading templates from {} (base '{}')", templates_dir, base);

        for template_dir in child_dirs(&templates_dir)? {
            let template = load_template(&template_dir, base, &mut tree.problems);
            tree.templates.push(template);
        }
    }

    info!(
        "Loaded {} template(s) from {} ({} problem(s))",
        tree.templates.len(),
        root,
        tree.problems.len()
    );
    Ok(tree)
}

/// Non-hidden sub-directories of `dir`, sorted by name
pub(crate) fn child_dirs(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_dir() || is_hidden(entry.file_name()) {
            continue;
        }
        dirs.push(to_utf8(entry.into_path())?);
    }
    Ok(dirs)
}

pub(crate) fn to_utf8(path: std::path::PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(|p| Error::invalid_path(p.display().to_string()))
}

pub(crate) fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}
