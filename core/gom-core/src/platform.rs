//! Target platform detection.
//!
//! Go names its artifacts by `GOOS`/`GOARCH` (`linux/amd64`, `darwin/arm64`),
//! which differs from Rust's `std::env::consts` naming. This module maps the
//! running host onto Go's vocabulary and carries the artifact kind alongside,
//! forming the [`TargetTriple`] used to pick a download from a release.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::GomError;

/// The packaging of a release artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// A `.tar.gz` or `.zip` toolchain archive.
    Archive,
    /// A platform installer (`.msi`, `.pkg`).
    Installer,
    /// The source tarball.
    Source,
    /// Any kind this version of gom does not know about.
    #[serde(other)]
    Other,
}

impl ArtifactKind {
    #[must_use = "returns the kind string without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::Installer => "installer",
            Self::Source => "source",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = GomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "archive" => Ok(Self::Archive),
            "installer" => Ok(Self::Installer),
            "source" => Ok(Self::Source),
            other => Err(GomError::invalid_value(
                "kind",
                format!("{other:?} is not one of archive, installer, source"),
            )),
        }
    }
}

/// A `(kind, os, arch)` selector for release artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetTriple {
    pub kind: ArtifactKind,
    pub os: String,
    pub arch: String,
}

impl TargetTriple {
    #[must_use]
    pub fn new(kind: ArtifactKind, os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            kind,
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Returns the archive triple of the running process.
    ///
    /// # Examples
    ///
    /// ```
    /// use gom_core::platform::{ArtifactKind, TargetTriple};
    ///
    /// let host = TargetTriple::host();
    /// assert_eq!(host.kind, ArtifactKind::Archive);
    /// ```
    #[must_use]
    pub fn host() -> Self {
        Self::new(ArtifactKind::Archive, host_os(), host_arch())
    }

    /// Replaces the fields given as `Some`, keeping the rest.
    #[must_use]
    pub fn with_overrides(
        mut self,
        kind: Option<ArtifactKind>,
        os: Option<String>,
        arch: Option<String>,
    ) -> Self {
        if let Some(kind) = kind {
            self.kind = kind;
        }
        if let Some(os) = os {
            self.os = os;
        }
        if let Some(arch) = arch {
            self.arch = arch;
        }
        self
    }

    /// Returns whether the triple targets Windows.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }
}

impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.os, self.arch)
    }
}

/// Maps `std::env::consts::OS` onto Go's `GOOS`.
#[must_use]
pub fn host_os() -> &'static str {
    goos(std::env::consts::OS)
}

/// Maps `std::env::consts::ARCH` onto Go's `GOARCH`.
#[must_use]
pub fn host_arch() -> &'static str {
    goarch(std::env::consts::ARCH)
}

fn goos(os: &'static str) -> &'static str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

fn goarch(arch: &'static str) -> &'static str {
    match arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "arm" => "armv6l",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    }
}

/// Returns the executable file extension of the host.
///
/// Returns `.exe` on Windows, empty string on Unix platforms.
#[must_use = "returns the extension string without side effects"]
pub fn executable_extension() -> &'static str {
    if cfg!(windows) { ".exe" } else { "" }
}
