use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{GomError, Result};
use crate::paths::{CONFIG_FILE_NAME, GomPaths};
use crate::probe::Bootstrap;
use crate::semver::Version;

/// Keys accepted by [`Config::get`] and [`Config::set`].
pub const CONFIG_KEYS: [&str; 5] = ["proxies", "envs_dir", "config_file", "last_update", "current"];

/// The gom configuration.
///
/// Every setter marks the value as modified; [`Config::save`] clears the mark.
/// The mark is not part of the serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Proxy URLs used for all outbound HTTP requests, tried in order.
    #[serde(default)]
    proxies: Vec<String>,
    /// Directory holding the installed environments.
    envs_dir: PathBuf,
    /// Where this configuration is persisted.
    #[serde(default)]
    config_file: PathBuf,
    /// Time of the last save.
    #[serde(default = "Utc::now")]
    last_update: DateTime<Utc>,
    /// Version of the active environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current: Option<Version>,
    #[serde(skip)]
    dirty: bool,
}

impl Config {
    /// Builds the default configuration for a data directory.
    ///
    /// `current` is the version of a Go runtime already present on the system,
    /// usually the result of [`Bootstrap::detect`].
    #[must_use]
    pub fn defaults(paths: &GomPaths, current: Option<Version>) -> Self {
        Self {
            proxies: Vec::new(),
            envs_dir: paths.envs.clone(),
            config_file: paths.config_file.clone(),
            last_update: Utc::now(),
            current,
            dirty: false,
        }
    }

    /// Builds the default configuration from a bootstrap value.
    #[must_use]
    pub fn from_bootstrap(bootstrap: &Bootstrap) -> Self {
        Self::defaults(&bootstrap.paths, bootstrap.runtime.clone())
    }

    /// Reads a configuration file.
    ///
    /// The returned value records `path` as its `config_file`, whatever the file
    /// itself says, and is not marked modified.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::Io`] if the file cannot be read or is not a valid
    /// configuration document.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GomError::io_error(format!("failed to read config {}", path.display()), e)
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|e| {
            GomError::io_error(
                format!("failed to parse config {}", path.display()),
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;
        config.config_file = path.to_path_buf();
        config.dirty = false;
        Ok(config)
    }

    /// Creates `dir` and `dir/envs`, then writes a default configuration to
    /// `dir/gom.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::Io`] if the directories cannot be created and
    /// [`GomError::PersistError`] if the file cannot be written.
    pub fn init(dir: &Path, current: Option<Version>) -> Result<Self> {
        let envs_dir = dir.join("envs");
        std::fs::create_dir_all(&envs_dir).map_err(|e| {
            GomError::io_error(format!("failed to create directory {}", envs_dir.display()), e)
        })?;

        let mut config = Self {
            proxies: Vec::new(),
            envs_dir,
            config_file: dir.join(CONFIG_FILE_NAME),
            last_update: Utc::now(),
            current,
            dirty: true,
        };
        config.save()?;
        Ok(config)
    }

    #[must_use]
    pub fn proxies(&self) -> &[String] {
        &self.proxies
    }

    #[must_use]
    pub fn envs_dir(&self) -> &Path {
        &self.envs_dir
    }

    #[must_use]
    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    #[must_use]
    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    #[must_use]
    pub fn current(&self) -> Option<&Version> {
        self.current.as_ref()
    }

    /// Returns whether the configuration changed since it was loaded or saved.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_proxies(&mut self, proxies: Vec<String>) {
        self.proxies = proxies;
        self.dirty = true;
    }

    pub fn set_envs_dir(&mut self, envs_dir: impl Into<PathBuf>) {
        self.envs_dir = envs_dir.into();
        self.dirty = true;
    }

    pub fn set_config_file(&mut self, config_file: impl Into<PathBuf>) {
        self.config_file = config_file.into();
        self.dirty = true;
    }

    pub fn set_last_update(&mut self, last_update: DateTime<Utc>) {
        self.last_update = last_update;
        self.dirty = true;
    }

    pub fn set_current(&mut self, current: Option<Version>) {
        self.current = current;
        self.dirty = true;
    }

    /// Returns a setting rendered as text.
    ///
    /// `proxies` is comma separated, `last_update` is RFC 3339 and an unset
    /// `current` is the empty string.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::UnknownKey`] for keys outside [`CONFIG_KEYS`].
    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "proxies" => Ok(self.proxies.join(",")),
            "envs_dir" => Ok(self.envs_dir.display().to_string()),
            "config_file" => Ok(self.config_file.display().to_string()),
            "last_update" => Ok(self.last_update.to_rfc3339()),
            "current" => Ok(self.current.as_ref().map(ToString::to_string).unwrap_or_default()),
            other => Err(GomError::unknown_key(other)),
        }
    }

    /// Updates a setting from text.
    ///
    /// `proxies` takes a comma-separated list and replaces the whole list. An
    /// empty `current` clears it.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::UnknownKey`] for unknown keys and
    /// [`GomError::InvalidValue`] for read-only keys or unacceptable values.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "proxies" => {
                let proxies = value
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect();
                self.set_proxies(proxies);
            }
            "envs_dir" | "config_file" if value.is_empty() => {
                return Err(GomError::invalid_value(key, "path must not be empty"));
            }
            "envs_dir" => self.set_envs_dir(value),
            "config_file" => self.set_config_file(value),
            "last_update" => {
                return Err(GomError::invalid_value(key, "last_update is read-only"));
            }
            "current" if value.is_empty() => self.set_current(None),
            "current" => {
                let version = Version::parse(value)
                    .map_err(|e| GomError::invalid_value(key, e.to_string()))?;
                self.set_current(Some(version));
            }
            other => return Err(GomError::unknown_key(other)),
        }
        Ok(())
    }

    /// Writes the configuration to its `config_file`.
    ///
    /// Stamps `last_update` with the current time, creates the parent
    /// directory if needed and overwrites the file in place. Clears the
    /// modified mark on success.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::PersistError`] if the file cannot be written.
    pub fn save(&mut self) -> Result<()> {
        let path = self.config_file.clone();
        self.last_update = Utc::now();

        let content =
            toml::to_string_pretty(&*self).map_err(|e| GomError::persist_error(&path, e))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| GomError::persist_error(&path, e))?;
        }
        std::fs::write(&path, content).map_err(|e| GomError::persist_error(&path, e))?;

        self.dirty = false;
        tracing::info!(path = %path.display(), "saved configuration");
        Ok(())
    }

    /// Saves only when the configuration was modified. Returns whether it saved.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::PersistError`] if the file cannot be written.
    pub fn save_if_dirty(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }
}
