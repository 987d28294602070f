//! Version comparison and half-open version spans for migration gating.
//!
//! Versions are `MAJOR.MINOR.PATCH` strings. A document with no declared
//! version sorts strictly below every concrete version, so it falls into
//! any span that is unbounded below.

use std::cmp::Ordering;

use semver::Version;

use crate::error::SchemaError;

/// Parse a `MAJOR.MINOR.PATCH` string.
///
/// # Errors
///
/// Returns [`SchemaError::InvalidVersion`] when the string is not a valid
/// semantic version.
pub fn parse_version(value: &str) -> Result<Version, SchemaError> {
    Version::parse(value).map_err(|e| SchemaError::InvalidVersion {
        value: value.to_string(),
        message: e.to_string(),
    })
}

/// Three-way comparison over concrete versions.
pub fn compare(a: &Version, b: &Version) -> Ordering {
    a.cmp(b)
}

/// Three-way comparison where an absent version is strictly less than any
/// concrete version.
pub fn compare_declared(declared: Option<&Version>, other: &Version) -> Ordering {
    match declared {
        None => Ordering::Less,
        Some(version) => version.cmp(other),
    }
}

/// Half-open version interval `[lower, upper)`.
///
/// `lower: None` is unbounded below and therefore catches documents with
/// no declared version. Migration steps gate on these spans; because every
/// step bumps the logical version to at least its own upper bound and
/// steps run in ascending order, no step can apply twice in one run.
#[derive(Debug, Clone)]
pub struct VersionSpan {
    pub lower: Option<Version>,
    pub upper: Version,
}

impl VersionSpan {
    pub fn new(lower: Option<Version>, upper: Version) -> Self {
        Self { lower, upper }
    }

    /// Span unbounded below: any version (or none) older than `upper`.
    pub fn below(upper: Version) -> Self {
        Self::new(None, upper)
    }

    /// True iff the declared version falls inside `[lower, upper)`.
    pub fn contains(&self, declared: Option<&Version>) -> bool {
        if let Some(lower) = &self.lower {
            if compare_declared(declared, lower) == Ordering::Less {
                return false;
            }
        }
        compare_declared(declared, &self.upper) == Ordering::Less
    }
}
