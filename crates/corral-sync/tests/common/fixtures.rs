//! Catalog directory fixtures

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// A catalog checkout laid out in a temp directory
pub struct CatalogFixture {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl CatalogFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");
        Self { _dir: dir, root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Write a file relative to the catalog root
    pub fn file(&self, relative: &str, content: &str) -> &Self {
        self.bytes(relative, content.as_bytes())
    }

    /// Write raw bytes relative to the catalog root
    pub fn bytes(&self, relative: &str, content: &[u8]) -> &Self {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, content).expect("write fixture file");
        self
    }

    /// Write `<templates_dir>/<name>/config.yml`
    pub fn template(&self, templates_dir: &str, name: &str, config: &str) -> &Self {
        self.file(&format!("{}/{}/config.yml", templates_dir, name), config)
    }

    /// Write a version folder with a minimal rancher-compose.yml
    pub fn version(
        &self,
        templates_dir: &str,
        name: &str,
        folder: &str,
        version: &str,
        minimum: Option<&str>,
    ) -> &Self {
        let mut compose = format!(".catalog:\n  name: {}\n  version: \"{}\"\n", name, version);
        if let Some(minimum) = minimum {
            compose.push_str(&format!("  minimum_rancher_version: \"{}\"\n", minimum));
        }
        self.file(
            &format!("{}/{}/{}/rancher-compose.yml", templates_dir, name, folder),
            &compose,
        )
    }
}

/// config.yml for an ordinary template
pub fn basic_config(name: &str) -> String {
    format!("name: {}\ncategory: Web\ndescription: {} template\nversion: 1.0.0\n", name, name)
}
