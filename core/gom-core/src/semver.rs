//! Semantic versions for Go releases and environments.
//!
//! [`Version`] wraps [`::semver::Version`] with a grammar that is slightly more
//! lenient than SemVer 2.0: a leading `v` is accepted and the patch component
//! may be omitted (`1.21` is read as `1.21.0`), which matches how Go labels its
//! first release of every minor line.
//!
//! ```text
//! v? MAJOR . MINOR ( . PATCH )? ( - PRE )? ( + BUILD )?
//! ```
//!
//! Go's own labels (`go1.21.3`, `go1.22rc1`) do not satisfy the grammar and are
//! normalized through [`Version::from_go`] first.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{GomError, Result};

/// An immutable, totally ordered version.
///
/// Ordering compares major, minor and patch numerically, then the pre-release
/// tag, where a version without pre-release sorts above one with it
/// (`1.21.0-rc2 < 1.21.0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version(::semver::Version);

impl Version {
    /// Parses a version string.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::InvalidVersion`] when the input does not match the
    /// grammar described in the module documentation.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || GomError::invalid_version(input);

        let body = input.strip_prefix('v').unwrap_or(input);
        let (body, build) = match body.split_once('+') {
            Some((rest, build)) => (rest, Some(build)),
            None => (body, None),
        };
        let (core, pre) = match body.split_once('-') {
            Some((rest, pre)) => (rest, Some(pre)),
            None => (body, None),
        };

        let numbers = core
            .split('.')
            .map(parse_numeric)
            .collect::<Option<Vec<u64>>>()
            .ok_or_else(invalid)?;
        let (major, minor, patch) = match numbers.as_slice() {
            [major, minor] => (*major, *minor, 0),
            [major, minor, patch] => (*major, *minor, *patch),
            _ => return Err(invalid()),
        };

        let mut version = ::semver::Version::new(major, minor, patch);
        if let Some(pre) = pre {
            if pre.is_empty() {
                return Err(invalid());
            }
            version.pre = ::semver::Prerelease::new(pre).map_err(|_| invalid())?;
        }
        if let Some(build) = build {
            if build.is_empty() {
                return Err(invalid());
            }
            version.build = ::semver::BuildMetadata::new(build).map_err(|_| invalid())?;
        }

        Ok(Self(version))
    }

    /// Normalizes a Go release label and parses it.
    ///
    /// Strips the `go` prefix and splits a glued pre-release tag off the
    /// numeric part, so `go1.21rc2` becomes `1.21.0-rc2` and `go1.21.3`
    /// becomes `1.21.3`. A bare major (`go1`) is read as `1.0.0`.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::InvalidVersion`] carrying the original label when the
    /// normalized form is still not a valid version.
    pub fn from_go(label: &str) -> Result<Self> {
        let trimmed = label.trim();
        let body = trimmed.strip_prefix("go").unwrap_or(trimmed);

        let split = body
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(body.len());
        let (numeric, suffix) = body.split_at(split);
        let numeric = numeric.trim_end_matches('.');

        let mut normalized = match numeric.matches('.').count() {
            0 => format!("{numeric}.0.0"),
            1 => format!("{numeric}.0"),
            _ => numeric.to_string(),
        };
        if !suffix.is_empty() {
            let suffix = suffix.strip_prefix('-').unwrap_or(suffix);
            normalized.push('-');
            normalized.push_str(suffix);
        }

        Self::parse(&normalized).map_err(|_| GomError::invalid_version(label))
    }

    /// Compares two versions. Equivalent to [`Ord::cmp`].
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    /// Returns `true` when `self` orders strictly before `other`.
    #[must_use]
    pub fn less_than(&self, other: &Self) -> bool {
        self < other
    }

    #[must_use]
    pub fn major(&self) -> u64 {
        self.0.major
    }

    #[must_use]
    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    #[must_use]
    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    /// Returns the pre-release tag, or an empty string for final releases.
    #[must_use]
    pub fn pre(&self) -> &str {
        self.0.pre.as_str()
    }

    /// Returns the build metadata, or an empty string when absent.
    #[must_use]
    pub fn build(&self) -> &str {
        self.0.build.as_str()
    }

    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        !self.0.pre.is_empty()
    }

    /// Returns the underlying [`::semver::Version`].
    #[must_use]
    pub fn as_semver(&self) -> &::semver::Version {
        &self.0
    }
}

fn parse_numeric(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Version {
    type Err = GomError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = GomError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).expect("valid version")
    }

    #[test]
    fn parse_accepts_full_versions() {
        let version = v("1.21.3");
        assert_eq!(version.major(), 1);
        assert_eq!(version.minor(), 21);
        assert_eq!(version.patch(), 3);
        assert!(!version.is_prerelease());
    }

    #[test]
    fn parse_defaults_missing_patch_to_zero() {
        assert_eq!(v("1.21"), v("1.21.0"));
    }

    #[test]
    fn parse_accepts_leading_v() {
        assert_eq!(v("v1.20.1"), v("1.20.1"));
    }

    #[test]
    fn parse_reads_pre_release_and_build() {
        let version = v("1.22.0-rc1+linux.amd64");
        assert_eq!(version.pre(), "rc1");
        assert_eq!(version.build(), "linux.amd64");
        assert!(version.is_prerelease());
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for input in [
            "", "1", "1.", "1..2", "a.b.c", "1.2.3.4", "1.2.x", "go1.21.3", "1.2.3-", "1.2.3+",
            "-1.2.3", "1.2 .3",
        ] {
            assert!(
                matches!(Version::parse(input), Err(GomError::InvalidVersion { .. })),
                "expected {input:?} to be rejected"
            );
        }
    }

    #[test]
    fn from_go_normalizes_release_labels() {
        assert_eq!(Version::from_go("go1.21.3").unwrap(), v("1.21.3"));
        assert_eq!(Version::from_go("go1.20").unwrap(), v("1.20.0"));
        assert_eq!(Version::from_go("go1").unwrap(), v("1.0.0"));
    }

    #[test]
    fn from_go_splits_glued_pre_release() {
        assert_eq!(Version::from_go("go1.21rc2").unwrap(), v("1.21.0-rc2"));
        assert_eq!(Version::from_go("go1.9beta1").unwrap(), v("1.9.0-beta1"));
    }

    #[test]
    fn from_go_reports_original_label() {
        let err = Version::from_go("gofoo").unwrap_err();
        assert_eq!(err.to_string(), "invalid version: \"gofoo\"");
    }

    #[test]
    fn pre_release_sorts_below_final_release() {
        assert!(v("1.21.0-rc2").less_than(&v("1.21.0")));
        assert!(v("1.21.0-rc1").less_than(&v("1.21.0-rc2")));
        assert!(v("1.20.14").less_than(&v("1.21.0-rc1")));
    }

    #[test]
    fn compare_is_a_strict_total_order() {
        let versions = [
            v("1.9.0"),
            v("1.10.0-beta1"),
            v("1.10.0"),
            v("1.20.0"),
            v("1.20.14"),
            v("1.21.0-rc1"),
            v("1.21.0-rc2"),
            v("1.21.0"),
            v("2.0.0"),
        ];
        for (i, a) in versions.iter().enumerate() {
            for (j, b) in versions.iter().enumerate() {
                assert_eq!(a.compare(b), i.cmp(&j), "{a} vs {b}");
                assert_eq!(a.compare(b), b.compare(a).reverse());
            }
        }
    }

    #[test]
    fn numeric_components_compare_numerically() {
        assert!(v("1.9.0") < v("1.10.0"));
        assert!(v("1.2.9") < v("1.2.10"));
    }

    #[test]
    fn display_round_trips_normalized_values() {
        for input in ["1.21.3", "1.22.0-rc1", "0.1.0+build.5", "2.0.0-beta.2+exp"] {
            assert_eq!(v(input).to_string(), input);
        }
        assert_eq!(v("v1.21").to_string(), "1.21.0");
    }

    #[test]
    fn from_str_delegates_to_parse() {
        let parsed: Version = "1.21.3".parse().unwrap();
        assert_eq!(parsed, v("1.21.3"));
        assert!("nope".parse::<Version>().is_err());
    }

    #[test]
    fn serializes_as_canonical_string() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            current: Version,
        }

        let encoded = toml::to_string(&Wrapper {
            current: v("1.21"),
        })
        .unwrap();
        assert_eq!(encoded.trim(), "current = \"1.21.0\"");

        let decoded: Wrapper = toml::from_str("current = \"v1.20.2\"").unwrap();
        assert_eq!(decoded.current, v("1.20.2"));

        assert!(toml::from_str::<Wrapper>("current = \"latest\"").is_err());
    }
}
