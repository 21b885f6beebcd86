//! Error types for corral-sync

use thiserror::Error;

/// Result type alias using corral-sync's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Repository sync error types
#[derive(Error, Debug)]
pub enum Error {
    /// Git operation failed
    #[error("Git operation failed: {message}")]
    GitOperation { message: String },

    /// Git command not found
    #[error("Git command not found. Please ensure git is installed and in PATH")]
    GitNotFound,

    /// Clone failed
    #[error("Failed to clone repository: {message}")]
    CloneFailed { message: String },

    /// Git command exceeded its time limit
    #[error("git {command} timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    /// Catalog checkout is missing or unreadable
    #[error("Catalog directory not found: {path}")]
    CatalogDirNotFound { path: String },

    /// Required file missing from a template or version folder
    #[error("Required file not found: {path}")]
    MissingFile { path: String },

    /// Invalid path
    #[error("Invalid path: {path}")]
    InvalidPath { path: String },

    /// Catalog id that does not name a directory directly under the root
    #[error("Catalog id '{id}' cannot be used as a checkout directory")]
    InvalidCatalogId { id: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// Directory walk error
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Core library error
    #[error("Core error: {0}")]
    Core(#[from] corral_core::Error),
}

impl Error {
    /// Create a git operation error
    pub fn git_operation(message: impl Into<String>) -> Self {
        Self::GitOperation {
            message: message.into(),
        }
    }

    /// Create a clone failed error
    pub fn clone_failed(message: impl Into<String>) -> Self {
        Self::CloneFailed {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(command: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            command: command.into(),
            seconds,
        }
    }

    /// Create a catalog dir not found error
    pub fn catalog_dir_not_found(path: impl Into<String>) -> Self {
        Self::CatalogDirNotFound { path: path.into() }
    }

    /// Create a missing file error
    pub fn missing_file(path: impl Into<String>) -> Self {
        Self::MissingFile { path: path.into() }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath { path: path.into() }
    }

    pub fn invalid_catalog_id(id: impl Into<String>) -> Self {
        Self::InvalidCatalogId { id: id.into() }
    }
}
