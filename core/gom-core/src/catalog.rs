//! Release catalog.
//!
//! A [`Catalog`] is the ordered list of releases returned by one fetch of the
//! release feed. Releases arrive with Go labels (`go1.21.3`, `go1.22rc1`);
//! [`Catalog::parse`] attaches a [`Version`] to each of them and drops the ones
//! that cannot be understood, after which the catalog can be sorted, filtered
//! to stable releases and queried for artifacts.

use std::collections::BTreeSet;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::errors::{GomError, Result};
use crate::feed::{DOWNLOAD_BASE, ReleaseFeed};
use crate::platform::{ArtifactKind, TargetTriple};
use crate::semver::Version;

/// A downloadable file belonging to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseArtifact {
    pub filename: String,
    /// `GOOS` of the artifact, empty for source tarballs.
    #[serde(default)]
    pub os: String,
    /// `GOARCH` of the artifact, empty for source tarballs.
    #[serde(default)]
    pub arch: String,
    #[serde(default)]
    pub version: String,
    /// Lowercase hex SHA-256 of the file.
    #[serde(default)]
    pub sha256: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    pub kind: ArtifactKind,
}

impl ReleaseArtifact {
    /// Returns the download URL of the artifact.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{DOWNLOAD_BASE}{}", self.filename)
    }

    fn matches(&self, target: &TargetTriple) -> bool {
        self.kind == target.kind && self.os == target.os && self.arch == target.arch
    }
}

/// One entry of the release feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    /// The Go label, e.g. `go1.21.3`.
    pub version: String,
    pub stable: bool,
    #[serde(default)]
    pub files: Vec<ReleaseArtifact>,
    #[serde(skip)]
    parsed: Option<Version>,
}

impl Release {
    #[must_use]
    pub fn new(version: impl Into<String>, stable: bool, files: Vec<ReleaseArtifact>) -> Self {
        Self {
            version: version.into(),
            stable,
            files,
            parsed: None,
        }
    }

    /// Parses the Go label into a [`Version`], caching the result.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::InvalidVersion`] if the label cannot be normalized.
    pub fn parse_version(&mut self) -> Result<&Version> {
        if self.parsed.is_none() {
            self.parsed = Some(Version::from_go(&self.version)?);
        }
        self.parsed
            .as_ref()
            .ok_or_else(|| GomError::invalid_version(&self.version))
    }

    /// Returns the parsed version, if [`Release::parse_version`] succeeded.
    #[must_use]
    pub fn parsed_version(&self) -> Option<&Version> {
        self.parsed.as_ref()
    }

    /// Finds the artifact matching `target` exactly.
    ///
    /// Kind, OS and architecture must all be equal; there is no fallback to a
    /// similar platform.
    #[must_use = "returns artifact info without side effects"]
    pub fn select_artifact(&self, target: &TargetTriple) -> Option<&ReleaseArtifact> {
        self.files.iter().find(|f| f.matches(target))
    }

    /// Returns the distinct `os/arch` pairs this release ships archives for,
    /// sorted alphabetically.
    #[must_use]
    pub fn platforms(&self) -> Vec<String> {
        self.files
            .iter()
            .filter(|f| f.kind == ArtifactKind::Archive && !f.os.is_empty())
            .map(|f| format!("{}/{}", f.os, f.arch))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// The ordered releases of one feed fetch.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    releases: Vec<Release>,
}

impl Catalog {
    #[must_use]
    pub fn new(releases: Vec<Release>) -> Self {
        Self { releases }
    }

    /// Retrieves and decodes the release feed.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::FetchError`] when the feed cannot be retrieved and
    /// [`GomError::DecodeError`] when the body is not a release array.
    pub async fn fetch(feed: &impl ReleaseFeed) -> Result<Self> {
        let body = feed.get().await?;
        let catalog = Self::from_json(&body)
            .map_err(|e| GomError::decode_error(format!("{}: {e}", feed.url())))?;
        tracing::debug!(url = feed.url(), releases = catalog.len(), "fetched release feed");
        Ok(catalog)
    }

    /// Decodes a release feed document. Unknown fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::DecodeError`] on malformed JSON.
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map(Self::new)
            .map_err(|e| GomError::decode_error(e.to_string()))
    }

    /// Parses every release version concurrently.
    ///
    /// Releases whose label cannot be parsed are logged and dropped. The order of
    /// the result is unspecified; call [`Catalog::sort`] afterwards.
    ///
    /// # Panics
    ///
    /// Resumes the panic of a parse task that panicked.
    pub async fn parse(self) -> Self {
        self.parse_until(std::future::pending::<()>())
            .await
            .unwrap_or_default()
    }

    /// Like [`Catalog::parse`], but stops as soon as `cancel` completes.
    ///
    /// On cancellation the outstanding tasks are detached, their results are
    /// discarded and `None` is returned.
    ///
    /// # Panics
    ///
    /// Resumes the panic of a parse task that panicked.
    pub async fn parse_until<F>(self, cancel: F) -> Option<Self>
    where
        F: Future<Output = ()>,
    {
        let mut tasks = JoinSet::new();
        let total = self.releases.len();
        for mut release in self.releases {
            tasks.spawn(async move {
                let outcome = release.parse_version().map(|_| ());
                match outcome {
                    Ok(()) => Ok(release),
                    Err(err) => Err((release.version, err)),
                }
            });
        }

        let mut cancel = std::pin::pin!(cancel);
        let mut releases = Vec::with_capacity(total);
        loop {
            tokio::select! {
                biased;
                () = &mut cancel => {
                    tasks.detach_all();
                    tracing::debug!(parsed = releases.len(), total, "release parsing cancelled");
                    return None;
                }
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok(Ok(release))) => releases.push(release),
                    Some(Ok(Err((label, err)))) => {
                        tracing::warn!(release = %label, error = %err, "dropping release with unparseable version");
                    }
                    Some(Err(err)) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                    Some(Err(err)) => {
                        tracing::warn!(error = %err, "release parse task did not complete");
                    }
                },
            }
        }

        tracing::debug!(parsed = releases.len(), total, "parsed release versions");
        Some(Self { releases })
    }

    /// Sorts releases newest first. Releases without a parsed version sink to the end.
    pub fn sort(&mut self) {
        self.releases
            .sort_by(|a, b| b.parsed_version().cmp(&a.parsed_version()));
    }

    /// Returns the stable releases, preserving their order.
    #[must_use]
    pub fn only_stable(&self) -> Self {
        Self::new(self.releases.iter().filter(|r| r.stable).cloned().collect())
    }

    /// Returns the first stable release, in current order, that ships an
    /// artifact for `target`, together with that artifact.
    ///
    /// The catalog is expected to be sorted; on an unsorted catalog this picks
    /// the first qualifying entry, not the newest.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::NoMatchingArtifact`] when no stable release qualifies.
    pub fn latest(&self, target: &TargetTriple) -> Result<(&Release, &ReleaseArtifact)> {
        self.releases
            .iter()
            .filter(|r| r.stable)
            .find_map(|r| r.select_artifact(target).map(|a| (r, a)))
            .ok_or_else(|| GomError::no_matching_artifact(target))
    }

    /// Finds the release with the given version.
    ///
    /// Releases that were not parsed yet are compared through their Go label.
    #[must_use]
    pub fn find(&self, version: &Version) -> Option<&Release> {
        self.releases.iter().find(|r| match r.parsed_version() {
            Some(parsed) => parsed == version,
            None => Version::from_go(&r.version).is_ok_and(|v| &v == version),
        })
    }

    #[must_use]
    pub fn releases(&self) -> &[Release] {
        &self.releases
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Release> {
        self.releases.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Release;
    type IntoIter = std::slice::Iter<'a, Release>;

    fn into_iter(self) -> Self::IntoIter {
        self.releases.iter()
    }
}
