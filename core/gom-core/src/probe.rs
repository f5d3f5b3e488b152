//! Process bootstrap.
//!
//! [`Bootstrap`] gathers, once and explicitly, the facts the rest of gom needs
//! before any configuration is read: where the data directory lives and which
//! Go runtime (if any) is already on `PATH`. Components receive these values
//! instead of computing them as hidden globals, which keeps them testable with
//! fixture paths and versions.

use std::path::Path;
use std::process::Command;

use crate::errors::Result;
use crate::paths::GomPaths;
use crate::semver::Version;

/// Facts about the environment gom runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootstrap {
    pub paths: GomPaths,
    /// Version reported by the `go` binary on `PATH`, if one was found.
    pub runtime: Option<Version>,
}

impl Bootstrap {
    /// Resolves the data directory and probes the Go runtime on `PATH`.
    ///
    /// The probe is best effort; a missing or broken `go` binary yields
    /// `runtime: None`.
    ///
    /// # Errors
    ///
    /// Returns an error only when the data directory cannot be determined.
    pub fn detect() -> Result<Self> {
        let paths = GomPaths::new()?;
        let runtime = probe_go_version();
        tracing::debug!(root = %paths.root.display(), runtime = ?runtime, "bootstrap detected");
        Ok(Self { paths, runtime })
    }

    /// Builds a bootstrap from known values.
    #[must_use]
    pub fn with(paths: GomPaths, runtime: Option<Version>) -> Self {
        Self { paths, runtime }
    }
}

/// Runs `go version` using the `go` binary found on `PATH`.
#[must_use]
pub fn probe_go_version() -> Option<Version> {
    let go = which::which("go").ok()?;
    probe_binary(&go)
}

/// Runs `<binary> version` and parses its output.
#[must_use]
pub fn probe_binary(binary: &Path) -> Option<Version> {
    let output = Command::new(binary).arg("version").output().ok()?;
    if !output.status.success() {
        tracing::debug!(binary = %binary.display(), status = %output.status, "go version failed");
        return None;
    }
    parse_go_version_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parses the output of `go version`, e.g. `go version go1.21.3 linux/amd64`.
#[must_use]
pub fn parse_go_version_output(output: &str) -> Option<Version> {
    let label = output.split_whitespace().nth(2)?;
    Version::from_go(label).ok()
}
