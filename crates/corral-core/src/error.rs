//! Error types for corral-core

use thiserror::Error;

/// Result type alias using corral-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Corral
#[derive(Error, Debug)]
pub enum Error {
    /// Catalog, template, or version lookup miss
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Version string without a usable numeric core
    #[error("Malformed version '{version}': {reason}")]
    MalformedVersion { version: String, reason: String },

    /// Two version strings of one template compare equal
    #[error("Duplicate version in template {template}: '{first}' and '{second}' compare equal")]
    DuplicateVersion {
        template: String,
        first: String,
        second: String,
    },

    /// `upgrade_from` expression that does not parse
    #[error("Invalid upgrade range '{range}': {reason}")]
    InvalidUpgradeRange { range: String, reason: String },

    /// Template is missing a required attribute
    #[error("Template {template} is missing required field: {field}")]
    MissingField { template: String, field: String },

    /// Repository sync or parse failure
    #[error("Sync failed for catalog {catalog}: {message}")]
    SyncFailure { catalog: String, message: String },

    /// Unknown filter name, unsupported operator, or bad filter value
    #[error("Invalid filter '{name}': {reason}")]
    InvalidFilter { name: String, reason: String },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a catalog not found error
    pub fn catalog_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "Catalog",
            id: id.into(),
        }
    }

    /// Create a template not found error
    pub fn template_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "Template",
            id: id.into(),
        }
    }

    /// Create a version not found error
    pub fn version_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "Template version",
            id: id.into(),
        }
    }

    /// Create a malformed version error
    pub fn malformed_version(version: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedVersion {
            version: version.into(),
            reason: reason.into(),
        }
    }

    /// Create a duplicate version error
    pub fn duplicate_version(
        template: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::DuplicateVersion {
            template: template.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    /// Create an invalid upgrade range error
    pub fn invalid_upgrade_range(range: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUpgradeRange {
            range: range.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(template: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            template: template.into(),
            field: field.into(),
        }
    }

    /// Create a sync failure error
    pub fn sync_failure(catalog: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SyncFailure {
            catalog: catalog.into(),
            message: message.into(),
        }
    }

    /// Create an invalid filter error
    pub fn invalid_filter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this error is a lookup miss
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
