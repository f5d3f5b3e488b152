//! Data directory layout.
//!
//! The default root directory is `<user config dir>/gom` (`~/.config/gom` on
//! Linux, `~/Library/Application Support/gom` on macOS, `%USERPROFILE%\gom` on
//! Windows), which can be overridden by setting the `GOM_HOME` environment
//! variable.
//!
//! ## Directory Structure
//!
//! ```text
//! ~/.config/gom/              # Root directory (or GOM_HOME)
//!   gom.toml                  # Canonical configuration file
//!   envs/                     # Installed Go environments (default envs_dir)
//!     1.21.3/
//!       bin/
//!         go
//!         gofmt
//!       .metadata.json        # Installation metadata
//!   bin/                      # Alias directory, symlinks into the active env
//!   downloads/                # Downloaded archives
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{GomError, Result};

/// Environment variable to override the default data root.
pub const GOM_HOME_ENV: &str = "GOM_HOME";

/// File name of the canonical configuration file.
pub const CONFIG_FILE_NAME: &str = "gom.toml";

/// Metadata file name stored in each environment directory.
const METADATA_FILE: &str = ".metadata.json";

/// Metadata about an installed environment.
///
/// This is stored in each environment directory as `.metadata.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvMetadata {
    /// The Go version unpacked into the environment.
    pub version: String,
    /// When the environment was installed.
    pub installed_at: DateTime<Utc>,
}

impl EnvMetadata {
    /// Creates metadata stamped with the current time.
    #[must_use = "returns new metadata without side effects"]
    pub fn now(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            installed_at: Utc::now(),
        }
    }

    /// Returns a human-readable relative time string (e.g., "2 days ago").
    #[must_use = "returns formatted time without side effects"]
    pub fn installed_ago(&self) -> String {
        let days = (Utc::now() - self.installed_at).num_days().max(0);
        format_days_ago(days.unsigned_abs())
    }

    /// Returns the path of the metadata file inside `env_dir`.
    #[must_use]
    pub fn path_in(env_dir: &Path) -> PathBuf {
        env_dir.join(METADATA_FILE)
    }

    /// Reads the metadata of an environment.
    ///
    /// Returns `None` if the metadata file does not exist or cannot be parsed.
    #[must_use = "returns metadata without side effects"]
    pub fn read(env_dir: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(Self::path_in(env_dir)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Writes the metadata into `env_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::Io`] if the file cannot be written.
    pub fn write(&self, env_dir: &Path) -> Result<()> {
        let path = Self::path_in(env_dir);
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            GomError::io_error("failed to serialize environment metadata", e.into())
        })?;
        std::fs::write(&path, content).map_err(|e| {
            GomError::io_error(format!("failed to write metadata to {}", path.display()), e)
        })
    }
}

fn format_days_ago(days: u64) -> String {
    match days {
        0 => "today".to_string(),
        1 => "yesterday".to_string(),
        2..=6 => format!("{days} days ago"),
        7..=13 => "1 week ago".to_string(),
        14..=27 => format!("{} weeks ago", days / 7),
        28..=59 => "1 month ago".to_string(),
        60..=364 => format!("{} months ago", days / 30),
        365..=729 => "1 year ago".to_string(),
        _ => format!("{} years ago", days / 365),
    }
}

/// Paths of the gom data directory.
///
/// This struct provides access to every gom-owned directory and file so path
/// construction stays consistent across the codebase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GomPaths {
    /// Root directory for all gom data (`GOM_HOME` or the platform default).
    pub root: PathBuf,
    /// Default directory holding installed environments.
    pub envs: PathBuf,
    /// Alias directory, the single `PATH` entry pointing at the active environment.
    pub alias: PathBuf,
    /// Directory for downloaded archives.
    pub downloads: PathBuf,
    /// The canonical configuration file.
    pub config_file: PathBuf,
}

impl GomPaths {
    /// Resolves the data root and builds the layout under it.
    ///
    /// The root directory is determined by:
    /// 1. The `GOM_HOME` environment variable if set and not blank
    /// 2. On Windows: `%USERPROFILE%\gom`
    /// 3. Elsewhere: `gom` in the user's configuration directory
    ///
    /// # Errors
    ///
    /// Returns [`GomError::Io`] if no suitable directory can be determined.
    pub fn new() -> Result<Self> {
        if let Some(home) = std::env::var_os(GOM_HOME_ENV).filter(|h| !h.is_empty()) {
            return Ok(Self::with_root(PathBuf::from(home)));
        }

        #[cfg(windows)]
        let base = dirs::home_dir();
        #[cfg(not(windows))]
        let base = dirs::config_dir();

        let base = base.ok_or_else(|| {
            GomError::io_error(
                format!("cannot determine the gom data directory, set {GOM_HOME_ENV}"),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            )
        })?;
        Ok(Self::with_root(base.join("gom")))
    }

    /// Builds the layout under a known root directory.
    #[must_use = "returns new paths instance without side effects"]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            envs: root.join("envs"),
            alias: root.join("bin"),
            downloads: root.join("downloads"),
            config_file: root.join(CONFIG_FILE_NAME),
            root,
        }
    }

    /// Returns the path for a downloaded archive file.
    #[must_use = "returns the path without side effects"]
    pub fn download_path(&self, filename: &str) -> PathBuf {
        self.downloads.join(filename)
    }

    /// Ensures the root, environments, alias and download directories exist.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::Io`] if any directory cannot be created.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.root, &self.envs, &self.alias, &self.downloads] {
            std::fs::create_dir_all(dir).map_err(|e| {
                GomError::io_error(format!("failed to create directory {}", dir.display()), e)
            })?;
        }
        Ok(())
    }
}
