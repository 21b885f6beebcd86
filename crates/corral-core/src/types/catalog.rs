//! Catalog source and lifecycle types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Branch used when a catalog does not name one
pub const DEFAULT_BRANCH: &str = "master";

/// A registered catalog repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSource {
    /// Catalog identifier, unique across the service
    pub id: String,

    /// Repository URI
    pub uri: String,

    /// Branch to track
    pub branch: String,
}

impl CatalogSource {
    pub fn new(id: impl Into<String>, uri: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            branch: branch.into(),
        }
    }
}

/// Catalog lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogState {
    Syncing,
    Active,
    Error,
}

impl CatalogState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogState::Syncing => "syncing",
            CatalogState::Active => "active",
            CatalogState::Error => "error",
        }
    }
}

impl fmt::Display for CatalogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "syncing" => Ok(CatalogState::Syncing),
            "active" => Ok(CatalogState::Active),
            "error" => Ok(CatalogState::Error),
            other => Err(format!(
                "unknown catalog state '{}', expected syncing, active or error",
                other
            )),
        }
    }
}

/// Latest lifecycle status of a catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStatus {
    pub state: CatalogState,

    /// Failure text from the last refresh, if it failed
    pub message: Option<String>,

    /// Time the current snapshot was published
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for CatalogStatus {
    fn default() -> Self {
        Self {
            state: CatalogState::Syncing,
            message: None,
            last_updated: None,
        }
    }
}
