//! Platform compatibility ranges

use crate::error::Result;
use crate::version::CatalogVersion;

/// Inclusive platform-version bounds declared by a template version
///
/// An absent bound leaves that side open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatibilityRange {
    minimum: Option<CatalogVersion>,
    maximum: Option<CatalogVersion>,
}

impl CompatibilityRange {
    /// Range with no bounds
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Build a range from declared bounds; empty strings count as absent
    pub fn from_bounds(minimum: Option<&str>, maximum: Option<&str>) -> Result<Self> {
        Ok(Self {
            minimum: parse_bound(minimum)?,
            maximum: parse_bound(maximum)?,
        })
    }

    pub fn minimum(&self) -> Option<&CatalogVersion> {
        self.minimum.as_ref()
    }

    pub fn maximum(&self) -> Option<&CatalogVersion> {
        self.maximum.as_ref()
    }

    /// Whether `platform` falls inside the range (both ends inclusive)
    pub fn contains(&self, platform: &CatalogVersion) -> bool {
        self.minimum_at_most(platform) && self.maximum_at_least(platform)
    }

    /// Minimum is absent or `<= platform`
    pub fn minimum_at_most(&self, platform: &CatalogVersion) -> bool {
        self.minimum.as_ref().is_none_or(|min| min <= platform)
    }

    /// Maximum is absent or `>= platform`
    pub fn maximum_at_least(&self, platform: &CatalogVersion) -> bool {
        self.maximum.as_ref().is_none_or(|max| max >= platform)
    }
}

fn parse_bound(bound: Option<&str>) -> Result<Option<CatalogVersion>> {
    match bound.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => CatalogVersion::parse(value).map(Some),
    }
}

/// Query-time platform filter
///
/// `minimum_lte` keeps versions whose declared minimum is at most the given
/// platform version; `maximum_gte` keeps versions whose declared maximum is
/// at least the given platform version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformFilter {
    pub minimum_lte: Option<CatalogVersion>,
    pub maximum_gte: Option<CatalogVersion>,
}

impl PlatformFilter {
    /// True when no bound is requested
    pub fn is_empty(&self) -> bool {
        self.minimum_lte.is_none() && self.maximum_gte.is_none()
    }

    /// Whether a version with the given range passes the filter
    ///
    /// `None` stands for a version whose declared bounds did not parse;
    /// it passes only when the filter is empty.
    pub fn admits(&self, range: Option<&CompatibilityRange>) -> bool {
        if self.is_empty() {
            return true;
        }
        let Some(range) = range else {
            return false;
        };

        self.minimum_lte
            .as_ref()
            .is_none_or(|platform| range.minimum_at_most(platform))
            && self
                .maximum_gte
                .as_ref()
                .is_none_or(|platform| range.maximum_at_least(platform))
    }
}
