//! On-disk catalog fixtures

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// Several catalog trees side by side, one directory per catalog id
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

    pub fn catalog_dir(&self, catalog: &str) -> Utf8PathBuf {
        self.root.join(catalog)
    }

    /// Write a file relative to a catalog's directory
    pub fn file(&self, catalog: &str, relative: &str, content: &str) -> &Self {
        self.bytes(catalog, relative, content.as_bytes())
    }

    /// Write raw bytes relative to a catalog's directory
    pub fn bytes(&self, catalog: &str, relative: &str, content: &[u8]) -> &Self {
        let path = self.catalog_dir(catalog).join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, content).expect("write fixture file");
        self
    }

    /// Write `<templates_dir>/<name>/config.yml`
    pub fn template(&self, catalog: &str, templates_dir: &str, name: &str, config: &str) -> &Self {
        self.file(
            catalog,
            &format!("{}/{}/config.yml", templates_dir, name),
            config,
        )
    }

    /// Write a version folder whose rancher-compose.yml declares `bounds`
    pub fn version(
        &self,
        catalog: &str,
        templates_dir: &str,
        name: &str,
        folder: &str,
        version: &str,
        bounds: (Option<&str>, Option<&str>),
    ) -> &Self {
        let mut compose = format!(".catalog:\n  name: {}\n  version: \"{}\"\n", name, version);
        if let Some(minimum) = bounds.0 {
            compose.push_str(&format!("  minimum_rancher_version: \"{}\"\n", minimum));
        }
        if let Some(maximum) = bounds.1 {
            compose.push_str(&format!("  maximum_rancher_version: \"{}\"\n", maximum));
        }
        compose.push_str(&format!("{}:\n  scale: 1\n", name));

        let dir = format!("{}/{}/{}", templates_dir, name, folder);
        self.file(catalog, &format!("{}/rancher-compose.yml", dir), &compose);
        self.file(
            catalog,
            &format!("{}/docker-compose.yml", dir),
            &format!("{}:\n  image: {}:{}\n  ports:\n    - \"8080:80\"\n", name, name, version),
        )
    }
}

/// config.yml for an ordinary template
pub fn basic_config(name: &str) -> String {
    format!("name: {}\ncategory: web\ndescription: {} template\nversion: 1.0.0\n", name, name)
}

/// Two catalogs:
///
/// - `library/templates`: `nginx` (1.0.0 needs v0.46.0, 1.1.0 unbounded,
///   2.0.0 needs v0.50.0 up to v1.0.0) and the system template `agent`
/// - `community/k8s-templates`: `redis` (3.2.0, 4.0.0)
pub fn standard_catalogs() -> CatalogFixture {
    let fixture = CatalogFixture::new();
    fixture
        .template("library", "templates", "nginx", &basic_config("nginx"))
        .version("library", "templates", "nginx", "0", "1.0.0", (Some("v0.46.0"), None))
        .version("library", "templates", "nginx", "1", "1.1.0", (None, None))
        .version(
            "library",
            "templates",
            "nginx",
            "2",
            "2.0.0",
            (Some("v0.50.0"), Some("v1.0.0")),
        )
        .template(
            "library",
            "templates",
            "agent",
            "name: agent\ncategory: infra\nisSystem: true\n",
        )
        .version("library", "templates", "agent", "0", "0.1.0", (None, None))
        .template("community", "k8s-templates", "redis", &basic_config("redis"))
        .version("community", "k8s-templates", "redis", "0", "3.2.0", (None, None))
        .version("community", "k8s-templates", "redis", "1", "4.0.0", (None, None));
    fixture
}
