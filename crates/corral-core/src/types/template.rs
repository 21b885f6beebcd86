//! Parsed template tree
//!
//! These types describe a catalog repository after it has been read from
//! disk and before it is indexed. Attributes the index requires are kept
//! optional here so that a broken template is reported by the index build
//! instead of being silently defaulted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Descriptive metadata of a template (from its `config.yml`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateMetadata {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,

    /// Version shown by default
    pub default_version: Option<String>,

    pub maintainer: Option<String>,
    pub license: Option<String>,
    pub project_url: Option<String>,
    pub labels: BTreeMap<String, String>,
}

/// One template folder of a catalog repository
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateSource {
    /// Folder name of the template
    pub folder: String,

    /// Prefix of the enclosing `<base>-templates` folder, empty for `templates`
    pub template_base: Option<String>,

    /// Whether the template is a system template
    pub is_system: Option<bool>,

    pub metadata: TemplateMetadata,

    /// Icon shared by versions that ship none of their own
    pub icon: Option<Asset>,

    /// README shared by versions that ship none of their own
    pub readme: Option<Asset>,

    pub versions: Vec<VersionSource>,
}

impl TemplateSource {
    /// Template name as used in identifiers: `<base>*<folder>` or `<folder>`
    pub fn qualified_name(&self) -> String {
        match self.template_base.as_deref() {
            Some(base) if !base.is_empty() => format!("{}*{}", base, self.folder),
            _ => self.folder.clone(),
        }
    }
}

/// One version folder of a template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionSource {
    /// Folder name of the version
    pub folder: String,

    /// Declared version string
    pub version: String,

    pub name: Option<String>,

    pub description: Option<String>,

    pub minimum_platform_version: Option<String>,

    pub maximum_platform_version: Option<String>,

    /// Range of installed versions allowed to upgrade to this one
    pub upgrade_from: Option<String>,

    /// File contents keyed by path relative to the version folder
    pub files: BTreeMap<String, String>,

    /// Deployable resources keyed by name
    pub bindings: BTreeMap<String, ServiceBinding>,

    pub questions: Vec<Question>,

    pub icon: Option<Asset>,

    pub readme: Option<Asset>,
}

/// Icon or README file, served as raw bytes instead of listed with the
/// version files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// File name as found in the folder
    pub file_name: String,
    pub content: Vec<u8>,
}

impl Asset {
    /// Media type guessed from the file extension
    pub fn media_type(&self) -> &'static str {
        let extension = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "png" => "image/png",
            "svg" => "image/svg+xml",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "ico" => "image/x-icon",
            "md" | "markdown" => "text/markdown; charset=utf-8",
            "txt" => "text/plain; charset=utf-8",
            _ => "application/octet-stream",
        }
    }
}

/// Labels, ports and scale of one deployable resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBinding {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub ports: Vec<String>,

    #[serde(default)]
    pub scale: u32,
}

/// Input a template version asks for at deploy time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub variable: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Remaining keys (`min`, `max`, `group`, ...) passed through as-is
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}
