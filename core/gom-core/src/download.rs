//! Artifact download and installation.
//!
//! Downloading sits behind the [`Downloader`] trait: given a URL, the published
//! digest and size, it leaves a verified file at the destination or fails.
//! [`HttpDownloader`] streams the body to a temporary file and renames it into
//! place once the transfer completes. A failed transfer is not retried.
//!
//! [`install_artifact`] ties a downloader to [`crate::archive`] and
//! [`crate::paths::EnvMetadata`] to turn a release artifact into a ready
//! environment directory.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::archive::extract_archive;
use crate::catalog::ReleaseArtifact;
use crate::errors::{GomError, Result};
use crate::feed::http_client;
use crate::paths::EnvMetadata;
use crate::verify::{verify_checksum, verify_size};

/// Request timeout in seconds. Go archives are large.
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Fetches a file and checks it against the published digest and size.
pub trait Downloader: Sync {
    /// Downloads `url` to `dest`.
    ///
    /// On success `dest` holds exactly `size` bytes hashing to `sha256`. On
    /// failure nothing is left at `dest`.
    fn fetch(
        &self,
        url: &str,
        sha256: &str,
        size: u64,
        dest: &Path,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Single-attempt streaming download over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    /// Creates a downloader routed through `proxies`.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::DownloadError`] if a proxy URL is invalid.
    pub fn new(proxies: &[String]) -> Result<Self> {
        let client = http_client(proxies, Some(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
            .map_err(|e| {
                GomError::download_error_with_source("failed to create HTTP client", e)
            })?;
        Ok(Self { client })
    }

    async fn stream_to(&self, url: &str, dest: &Path) -> Result<u64> {
        let response = self.client.get(url).send().await.map_err(|e| {
            GomError::download_error_with_source(format!("failed to connect to {url}"), e)
        })?;

        if !response.status().is_success() {
            return Err(GomError::download_error(format!(
                "HTTP {} for {url}",
                response.status()
            )));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| GomError::io_error(format!("failed to create {}", dest.display()), e))?;

        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                GomError::download_error_with_source(format!("failed to read from {url}"), e)
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|e| GomError::io_error(format!("failed to write {}", dest.display()), e))?;
            downloaded += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| GomError::io_error(format!("failed to flush {}", dest.display()), e))?;

        Ok(downloaded)
    }
}

impl Downloader for HttpDownloader {
    async fn fetch(&self, url: &str, sha256: &str, size: u64, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                GomError::io_error(format!("failed to create {}", parent.display()), e)
            })?;
        }

        if sha256.trim().is_empty() {
            return Err(GomError::download_error(format!(
                "no sha256 digest published for {url}, refusing to install it unverified"
            )));
        }

        let temp_path = temp_path_for(dest);
        tracing::info!(%url, dest = %dest.display(), "downloading");

        let downloaded = match self.stream_to(url, &temp_path).await {
            Ok(n) => n,
            Err(e) => {
                let _ = tokio::fs::remove_file(&temp_path).await;
                return Err(e);
            }
        };
        tracing::debug!(bytes = downloaded, "download finished");

        if let Err(e) = check(&temp_path, sha256, size) {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }

        tokio::fs::rename(&temp_path, dest).await.map_err(|e| {
            GomError::io_error(
                format!(
                    "failed to rename {} to {}",
                    temp_path.display(),
                    dest.display()
                ),
                e,
            )
        })
    }
}

/// Verifies size first since it is cheap, then the digest. A missing digest
/// is an error; a zero size only skips the size check.
fn check(path: &Path, sha256: &str, size: u64) -> Result<()> {
    if sha256.trim().is_empty() {
        return Err(GomError::download_error(format!(
            "no sha256 digest published for {}",
            path.display()
        )));
    }
    if size > 0 {
        verify_size(path, size)?;
    } else {
        tracing::warn!(path = %path.display(), "no size published, checking digest only");
    }
    verify_checksum(path, sha256)
}

fn temp_path_for(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    dest.with_file_name(name)
}

/// Downloads `artifact` into `downloads_dir`, extracts it into `env_dir` and
/// records the installation metadata.
///
/// Extraction goes to a hidden sibling of `env_dir` first and is renamed into
/// place, so an interrupted install never looks like an environment. The
/// downloaded archive is removed afterwards.
///
/// # Errors
///
/// Returns [`GomError::EnvironmentExists`] if `env_dir` already exists, and
/// propagates download, verification and extraction failures.
pub async fn install_artifact(
    downloader: &impl Downloader,
    artifact: &ReleaseArtifact,
    downloads_dir: &Path,
    env_dir: &Path,
) -> Result<()> {
    let name = env_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if env_dir.exists() {
        return Err(GomError::environment_exists(name));
    }

    let archive_path = downloads_dir.join(&artifact.filename);
    downloader
        .fetch(&artifact.url(), &artifact.sha256, artifact.size, &archive_path)
        .await?;

    let staging = env_dir.with_file_name(format!(".{name}.partial"));
    if staging.exists() {
        tokio::fs::remove_dir_all(&staging).await.map_err(|e| {
            GomError::io_error(format!("failed to clear {}", staging.display()), e)
        })?;
    }

    let extracted = {
        let archive_path = archive_path.clone();
        let staging = staging.clone();
        tokio::task::spawn_blocking(move || extract_archive(&archive_path, &staging))
            .await
            .map_err(|e| GomError::archive_error(format!("extraction task failed: {e}")))?
    };
    if let Err(e) = extracted {
        let _ = tokio::fs::remove_dir_all(&staging).await;
        return Err(e);
    }

    tokio::fs::rename(&staging, env_dir).await.map_err(|e| {
        GomError::io_error(format!("failed to move into {}", env_dir.display()), e)
    })?;

    EnvMetadata::now(artifact.version.clone()).write(env_dir)?;

    if let Err(e) = tokio::fs::remove_file(&archive_path).await {
        tracing::debug!(path = %archive_path.display(), error = %e, "could not remove archive");
    }

    tracing::info!(env = %env_dir.display(), "installed {}", artifact.filename);
    Ok(())
}
