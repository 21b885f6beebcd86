//! `upgrade_from` ranges
//!
//! A template version may restrict which installed versions are allowed to
//! upgrade to it. The range is written as alternatives separated by `||`;
//! each alternative is a whitespace-separated list of comparators that must
//! all hold. A comparator is one of `<`, `<=`, `>`, `>=`, `=`, `==` or `!=`
//! followed by a version, and a bare version means `=`:
//!
//! ```text
//! >=1.0.0 <2.0.0 || 2.1.0
//! ```
//!
//! Versions compare with [`CatalogVersion`] ordering.

use crate::error::{Error, Result};
use crate::version::CatalogVersion;
use std::cmp::Ordering;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Op {
    /// Split a leading operator off `token`
    fn split(token: &str) -> (Self, &str) {
        const OPS: [(&str, Op); 7] = [
            ("<=", Op::Le),
            (">=", Op::Ge),
            ("==", Op::Eq),
            ("!=", Op::Ne),
            ("<", Op::Lt),
            (">", Op::Gt),
            ("=", Op::Eq),
        ];
        OPS.iter()
            .find_map(|(prefix, op)| token.strip_prefix(*prefix).map(|rest| (*op, rest)))
            .unwrap_or((Op::Eq, token))
    }

    fn test(self, ord: Ordering) -> bool {
        match self {
            Op::Lt => ord == Ordering::Less,
            Op::Le => ord != Ordering::Greater,
            Op::Gt => ord == Ordering::Greater,
            Op::Ge => ord != Ordering::Less,
            Op::Eq => ord == Ordering::Equal,
            Op::Ne => ord != Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Comparator {
    op: Op,
    version: CatalogVersion,
}

impl Comparator {
    fn admits(&self, installed: &CatalogVersion) -> bool {
        self.op.test(installed.cmp(&self.version))
    }
}

/// Set of installed versions allowed to upgrade to a template version
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeRange {
    alternatives: Vec<Vec<Comparator>>,
}

impl UpgradeRange {
    /// Range that admits no version
    pub fn nothing() -> Self {
        Self::default()
    }

    pub fn parse(input: &str) -> Result<Self> {
        let mut alternatives = Vec::new();

        for alternative in input.split("||") {
            let mut comparators = Vec::new();
            let mut tokens = alternative.split_whitespace();

            while let Some(token) = tokens.next() {
                let (op, mut version) = Op::split(token);
                // `>= 1.0.0` puts the version in the next token
                if version.is_empty() {
                    version = tokens.next().ok_or_else(|| {
                        Error::invalid_upgrade_range(input, format!("'{}' has no version", token))
                    })?;
                }
                let version = CatalogVersion::parse(version)
                    .map_err(|e| Error::invalid_upgrade_range(input, e.to_string()))?;
                comparators.push(Comparator { op, version });
            }

            if comparators.is_empty() {
                return Err(Error::invalid_upgrade_range(input, "empty alternative"));
            }
            alternatives.push(comparators);
        }

        Ok(Self { alternatives })
    }

    /// Whether an installation at `installed` may upgrade
    pub fn admits(&self, installed: &CatalogVersion) -> bool {
        self.alternatives
            .iter()
            .any(|all| all.iter().all(|c| c.admits(installed)))
    }
}

impl FromStr for UpgradeRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
