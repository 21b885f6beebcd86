//! Version string ordering
//!
//! Template versions are written as `MAJOR.MINOR.PATCH[-PRERELEASE]` with an
//! optional leading `v`. Extra numeric segments (`1.2.3.4`) are accepted and
//! compared in order. `+build` metadata is ignored.
//!
//! Equality is by rank, not by spelling: `v1.0.0`, `1.0.0+abc` and `1.0.0.0`
//! all compare equal to `1.0.0`. The index treats two folders whose versions
//! compare equal as a duplicate and reports it, so such spellings never need
//! a tie-break here.
//!
//! Pre-release tags of the form `alpha<N>` and `beta<N>` (with an optional
//! `.` or `-` before the number) rank by label and then numerically. Any
//! other tag ranks above every alpha/beta tag and compares lexically with
//! other such tags, which keeps the order total.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Minimum number of numeric segments in a version core
const MIN_CORE_SEGMENTS: usize = 3;

/// Parsed, comparable version string
#[derive(Debug, Clone)]
pub struct CatalogVersion {
    raw: String,
    core: Vec<u64>,
    pre: Option<PreRelease>,
}

/// Pre-release tag rank key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum PreRelease {
    /// `alpha` (rank 0) or `beta` (rank 1) followed by an optional number
    Labelled { rank: u8, number: u64 },
    /// Anything else, compared lexically
    Opaque(String),
}

impl PreRelease {
    fn parse(tag: &str) -> Self {
        for (rank, label) in ["alpha", "beta"].iter().enumerate() {
            let Some(rest) = tag.strip_prefix(label) else {
                continue;
            };
            let digits = rest
                .strip_prefix('.')
                .or_else(|| rest.strip_prefix('-'))
                .unwrap_or(rest);

            if digits.is_empty() && rest.is_empty() {
                return Self::Labelled {
                    rank: rank as u8,
                    number: 0,
                };
            }
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(number) = digits.parse::<u64>() {
                    return Self::Labelled {
                        rank: rank as u8,
                        number,
                    };
                }
            }
        }
        Self::Opaque(tag.to_string())
    }
}

impl CatalogVersion {
    /// Parse a version string
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let body = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        // Build metadata never participates in ordering
        let body = body.split_once('+').map_or(body, |(head, _)| head);

        let (core_str, pre_str) = match body.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (body, None),
        };

        let mut core = Vec::new();
        for segment in core_str.split('.') {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::malformed_version(
                    input,
                    format!("'{}' is not a numeric segment", segment),
                ));
            }
            let value = segment.parse::<u64>().map_err(|_| {
                Error::malformed_version(input, format!("segment '{}' is out of range", segment))
            })?;
            core.push(value);
        }

        if core.len() < MIN_CORE_SEGMENTS {
            return Err(Error::malformed_version(
                input,
                "expected at least MAJOR.MINOR.PATCH",
            ));
        }

        let pre = match pre_str {
            Some("") => {
                return Err(Error::malformed_version(input, "empty pre-release tag"));
            }
            Some(tag) => Some(PreRelease::parse(tag)),
            None => None,
        };

        Ok(Self {
            raw: input.to_string(),
            core,
            pre,
        })
    }

    /// The string this version was parsed from
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this version carries a pre-release tag
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }

    fn cmp_core(&self, other: &Self) -> Ordering {
        let len = self.core.len().max(other.core.len());
        (0..len)
            .map(|i| {
                let a = self.core.get(i).copied().unwrap_or(0);
                let b = other.core.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

/// Compare two version strings
///
/// Fails with `MalformedVersion` if either side does not parse.
pub fn compare(a: &str, b: &str) -> Result<Ordering> {
    let a = CatalogVersion::parse(a)?;
    let b = CatalogVersion::parse(b)?;
    Ok(a.cmp(&b))
}

impl Ord for CatalogVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_core(other)
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for CatalogVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CatalogVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CatalogVersion {}

impl FromStr for CatalogVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CatalogVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
