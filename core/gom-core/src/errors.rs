//! Error types for gom.
//!
//! This module defines the `GomError` enum which consolidates every failure
//! the core can report. Library functions return [`Result`]; the `gom` binary
//! wraps these in `anyhow` with additional context.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the core crate.
pub type Result<T, E = GomError> = std::result::Result<T, E>;

/// Consolidated error type for gom operations.
///
/// Each variant includes context-specific information so that the CLI can
/// print an actionable message without further inspection.
#[derive(Debug, Error)]
pub enum GomError {
    /// A version string did not satisfy the version grammar.
    #[error("invalid version: {input:?}")]
    InvalidVersion {
        /// The rejected input.
        input: String,
    },

    /// The release feed could not be retrieved.
    #[error("failed to fetch release feed from {url}: {message}")]
    FetchError {
        /// URL that was requested.
        url: String,
        /// Transport or status description.
        message: String,
    },

    /// The release feed was retrieved but is not valid JSON for the expected shape.
    #[error("failed to decode release feed: {message}")]
    DecodeError {
        /// Description of the decoding failure.
        message: String,
    },

    /// No release has an artifact for the requested target.
    #[error("no release artifact matches {target}")]
    NoMatchingArtifact {
        /// Rendered target triple.
        target: String,
    },

    /// A specific release is absent from the feed.
    #[error("release {version} not found in the release feed")]
    ReleaseNotFound {
        /// The requested version.
        version: String,
    },

    /// Every discovered configuration file failed to load.
    #[error("no valid configuration file among {} candidate(s)", tried.len())]
    NoValidConfig {
        /// Candidates that were attempted, in rank order.
        tried: Vec<PathBuf>,
    },

    /// The configuration could not be written.
    #[error("failed to persist configuration to {}", path.display())]
    PersistError {
        /// Target path of the write.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A configuration key is not recognised.
    #[error("unknown configuration key: {key}")]
    UnknownKey {
        /// The rejected key.
        key: String,
    },

    /// A value is not acceptable for its configuration key or field.
    #[error("invalid value for {key}: {message}")]
    InvalidValue {
        /// Key being set.
        key: String,
        /// Why the value was rejected.
        message: String,
    },

    /// An environment with this name is already registered.
    #[error("environment already exists: {name}")]
    EnvironmentExists {
        /// Name of the environment.
        name: String,
    },

    /// No environment with this name is registered or installed.
    #[error("environment not found: {name}")]
    EnvironmentNotFound {
        /// Name of the environment.
        name: String,
    },

    /// Activating an environment failed.
    #[error("failed to switch to environment {name}: {message}")]
    SwitchError {
        /// Target environment.
        name: String,
        /// What went wrong.
        message: String,
        /// The underlying I/O error, if any.
        #[source]
        source: Option<std::io::Error>,
    },

    /// Network error while downloading an artifact.
    #[error("download error: {message}")]
    DownloadError {
        /// Description of the download error.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Checksum verification failed.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The expected checksum.
        expected: String,
        /// The actual checksum.
        actual: String,
    },

    /// Downloaded size differs from the size announced by the feed.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Size announced by the feed.
        expected: u64,
        /// Size on disk.
        actual: u64,
    },

    /// Archive extraction failed.
    #[error("archive error: {message}")]
    ArchiveError {
        /// Description of the archive error.
        message: String,
    },

    /// Error reading or writing files.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O operation that failed.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl GomError {
    /// Creates a new `InvalidVersion` error.
    #[must_use]
    pub fn invalid_version(input: impl Into<String>) -> Self {
        Self::InvalidVersion {
            input: input.into(),
        }
    }

    /// Creates a new `FetchError`.
    #[must_use]
    pub fn fetch_error(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FetchError {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a new `DecodeError`.
    #[must_use]
    pub fn decode_error(message: impl Into<String>) -> Self {
        Self::DecodeError {
            message: message.into(),
        }
    }

    /// Creates a new `NoMatchingArtifact` error.
    #[must_use]
    pub fn no_matching_artifact(target: impl std::fmt::Display) -> Self {
        Self::NoMatchingArtifact {
            target: target.to_string(),
        }
    }

    /// Creates a new `ReleaseNotFound` error.
    #[must_use]
    pub fn release_not_found(version: impl Into<String>) -> Self {
        Self::ReleaseNotFound {
            version: version.into(),
        }
    }

    /// Creates a new `PersistError`.
    #[must_use]
    pub fn persist_error(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::PersistError {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Creates a new `UnknownKey` error.
    #[must_use]
    pub fn unknown_key(key: impl Into<String>) -> Self {
        Self::UnknownKey { key: key.into() }
    }

    /// Creates a new `InvalidValue` error.
    #[must_use]
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates a new `EnvironmentExists` error.
    #[must_use]
    pub fn environment_exists(name: impl Into<String>) -> Self {
        Self::EnvironmentExists { name: name.into() }
    }

    /// Creates a new `EnvironmentNotFound` error.
    #[must_use]
    pub fn environment_not_found(name: impl Into<String>) -> Self {
        Self::EnvironmentNotFound { name: name.into() }
    }

    /// Creates a new `SwitchError` without an underlying I/O error.
    #[must_use]
    pub fn switch_error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SwitchError {
            name: name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `SwitchError` caused by an I/O error.
    #[must_use]
    pub fn switch_io_error(
        name: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::SwitchError {
            name: name.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Creates a new `DownloadError`.
    #[must_use]
    pub fn download_error(message: impl Into<String>) -> Self {
        Self::DownloadError {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `DownloadError` with a source error.
    #[must_use]
    pub fn download_error_with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::DownloadError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a new `ChecksumMismatch` error.
    #[must_use]
    pub fn checksum_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ChecksumMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a new `SizeMismatch` error.
    #[must_use]
    pub const fn size_mismatch(expected: u64, actual: u64) -> Self {
        Self::SizeMismatch { expected, actual }
    }

    /// Creates a new `ArchiveError`.
    #[must_use]
    pub fn archive_error(message: impl Into<String>) -> Self {
        Self::ArchiveError {
            message: message.into(),
        }
    }

    /// Creates a new `Io` error from an I/O error with context.
    #[must_use]
    pub fn io_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }
}
