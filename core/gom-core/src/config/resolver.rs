use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::errors::{GomError, Result};
use crate::paths::{CONFIG_FILE_NAME, GomPaths};
use crate::semver::Version;

use super::Config;

/// Where the resolver looks for configuration files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Candidate files in priority order. Missing files are skipped.
    pub candidates: Vec<PathBuf>,
}

impl ResolverOptions {
    #[must_use]
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    /// The standard search list: the canonical file in the data directory,
    /// `./gom/gom.toml`, `./gom.toml` and `gom.toml` in the user configuration
    /// directory.
    #[must_use]
    pub fn standard(paths: &GomPaths) -> Self {
        let mut candidates = vec![
            paths.config_file.clone(),
            Path::new("gom").join(CONFIG_FILE_NAME),
            PathBuf::from(CONFIG_FILE_NAME),
        ];
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join(CONFIG_FILE_NAME));
        }
        Self { candidates }
    }

    /// Considers only `path`.
    #[must_use]
    pub fn exact(path: impl Into<PathBuf>) -> Self {
        Self {
            candidates: vec![path.into()],
        }
    }
}

/// Values that replace configuration fields after resolution.
///
/// Each `Some` field replaces the corresponding setting and marks the
/// configuration modified. `proxies` replaces the whole list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub proxies: Option<Vec<String>>,
    pub envs_dir: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub current: Option<Version>,
}

impl ConfigOverrides {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proxies.is_none()
            && self.envs_dir.is_none()
            && self.config_file.is_none()
            && self.current.is_none()
    }

    /// Applies the overrides to `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(proxies) = &self.proxies {
            config.set_proxies(proxies.clone());
        }
        if let Some(envs_dir) = &self.envs_dir {
            config.set_envs_dir(envs_dir.clone());
        }
        if let Some(config_file) = &self.config_file {
            config.set_config_file(config_file.clone());
        }
        if let Some(current) = &self.current {
            config.set_current(Some(current.clone()));
        }
    }
}

/// Produces the effective configuration from candidate files.
///
/// Resolution runs in a fixed order:
///
/// 1. keep the candidates that exist as files, dropping duplicates
/// 2. rank them by modification time, newest first (ties keep candidate order)
/// 3. load the newest one
/// 4. if it fails, try the others in rank order; the first success wins
/// 5. if no candidate exists at all, return the defaults
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    options: ResolverOptions,
    defaults: Config,
}

impl ConfigResolver {
    #[must_use]
    pub fn new(options: ResolverOptions, defaults: Config) -> Self {
        Self { options, defaults }
    }

    /// The configuration used when no candidate file exists.
    #[must_use]
    pub fn defaults(&self) -> &Config {
        &self.defaults
    }

    #[must_use]
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Returns the candidates that exist as regular files, without duplicates.
    #[must_use]
    pub fn discover(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for path in &self.options.candidates {
            if !path.is_file() {
                continue;
            }
            let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
            if seen.insert(key) {
                found.push(path.clone());
            }
        }
        tracing::debug!(
            candidates = self.options.candidates.len(),
            found = found.len(),
            "discovered config files"
        );
        found
    }

    /// Resolves the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::NoValidConfig`] when candidate files exist but none
    /// of them loads.
    pub fn resolve(&self) -> Result<Config> {
        let ranked = rank_by_mtime(self.discover());
        if ranked.is_empty() {
            tracing::debug!("no config file found, using defaults");
            return Ok(self.defaults.clone());
        }

        for path in &ranked {
            match Config::load(path) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "loaded configuration");
                    return Ok(config);
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable config file");
                }
            }
        }

        Err(GomError::NoValidConfig { tried: ranked })
    }

    /// Resolves the configuration, then applies `overrides`.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigResolver::resolve`].
    pub fn resolve_with(&self, overrides: &ConfigOverrides) -> Result<Config> {
        let mut config = self.resolve()?;
        overrides.apply(&mut config);
        Ok(config)
    }
}

/// Orders paths by modification time, newest first. The sort is stable, so
/// files with equal timestamps keep their relative order. Files whose
/// timestamp cannot be read rank last.
fn rank_by_mtime(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut stamped: Vec<(SystemTime, PathBuf)> = paths
        .into_iter()
        .map(|path| {
            let modified = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, path)
        })
        .collect();
    stamped.sort_by(|a, b| b.0.cmp(&a.0));
    let ranked: Vec<PathBuf> = stamped.into_iter().map(|(_, path)| path).collect();
    tracing::debug!(ranked = ?ranked, "ranked config files");
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use std::time::Duration;

    fn write_config(path: &Path, envs_dir: &str, age_secs: u64) {
        std::fs::write(path, format!("envs_dir = \"{envs_dir}\"\n")).unwrap();
        set_age(path, age_secs);
    }

    fn set_age(path: &Path, age_secs: u64) {
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        std::fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    fn defaults(temp: &TempDir) -> Config {
        Config::defaults(&GomPaths::with_root(temp.path().join("home")), None)
    }

    #[test]
    fn no_candidates_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let resolver = ConfigResolver::new(
            ResolverOptions::new(vec![temp.path().join("a.toml"), temp.path().join("b.toml")]),
            defaults(&temp),
        );
        let config = resolver.resolve().unwrap();
        assert_eq!(config, *resolver.defaults());
    }

    #[test]
    fn newest_file_wins() {
        let temp = TempDir::new().unwrap();
        let old = temp.path().join("old.toml");
        let new = temp.path().join("new.toml");
        write_config(&old, "/old", 300);
        write_config(&new, "/new", 10);

        let resolver = ConfigResolver::new(
            ResolverOptions::new(vec![old.clone(), new.clone()]),
            defaults(&temp),
        );
        let config = resolver.resolve().unwrap();
        assert_eq!(config.envs_dir(), Path::new("/new"));
        assert_eq!(config.config_file(), new);
    }

    #[test]
    fn corrupt_newest_falls_back_to_next_newest() {
        let temp = TempDir::new().unwrap();
        let t1 = temp.path().join("t1.toml");
        let t2 = temp.path().join("t2.toml");
        let t3 = temp.path().join("t3.toml");
        write_config(&t1, "/t1", 300);
        write_config(&t2, "/t2", 200);
        std::fs::write(&t3, "envs_dir = [broken").unwrap();
        set_age(&t3, 100);

        let resolver = ConfigResolver::new(
            ResolverOptions::new(vec![t3.clone(), t1.clone(), t2.clone()]),
            defaults(&temp),
        );
        let config = resolver.resolve().unwrap();
        assert_eq!(config.envs_dir(), Path::new("/t2"));
        assert_eq!(config.config_file(), t2);
    }

    #[test]
    fn all_corrupt_reports_no_valid_config() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.toml");
        let b = temp.path().join("b.toml");
        std::fs::write(&a, "not = [valid").unwrap();
        std::fs::write(&b, "proxies = []\n").unwrap();

        let resolver = ConfigResolver::new(
            ResolverOptions::new(vec![a.clone(), b.clone()]),
            defaults(&temp),
        );
        match resolver.resolve() {
            Err(GomError::NoValidConfig { tried }) => {
                assert_eq!(tried.len(), 2);
                assert!(tried.contains(&a));
                assert!(tried.contains(&b));
            }
            other => panic!("expected NoValidConfig, got {other:?}"),
        }
    }

    #[test]
    fn ties_keep_candidate_order() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first.toml");
        let second = temp.path().join("second.toml");
        write_config(&first, "/first", 0);
        write_config(&second, "/second", 0);
        let stamp = SystemTime::now() - Duration::from_secs(50);
        for path in [&first, &second] {
            std::fs::File::options()
                .write(true)
                .open(path)
                .unwrap()
                .set_modified(stamp)
                .unwrap();
        }

        let ranked = rank_by_mtime(vec![second.clone(), first.clone()]);
        assert_eq!(ranked, vec![second, first]);
    }

    #[test]
    fn discover_skips_missing_directories_and_duplicates() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("gom.toml");
        write_config(&file, "/e", 0);
        let dir = temp.path().join("adir.toml");
        std::fs::create_dir(&dir).unwrap();

        let resolver = ConfigResolver::new(
            ResolverOptions::new(vec![
                file.clone(),
                temp.path().join("missing.toml"),
                dir,
                temp.path().join(".").join("gom.toml"),
            ]),
            defaults(&temp),
        );
        assert_eq!(resolver.discover(), vec![file]);
    }

    #[test]
    fn overrides_replace_fields_and_mark_dirty() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("gom.toml");
        std::fs::write(
            &file,
            "envs_dir = \"/e\"\nproxies = [\"http://old:1\"]\ncurrent = \"1.20.0\"\n",
        )
        .unwrap();

        let overrides = ConfigOverrides {
            proxies: Some(vec!["http://new:2".to_string()]),
            current: Some(Version::parse("1.21.0").unwrap()),
            ..ConfigOverrides::default()
        };
        let resolver = ConfigResolver::new(ResolverOptions::exact(&file), defaults(&temp));
        let config = resolver.resolve_with(&overrides).unwrap();

        assert_eq!(config.proxies(), ["http://new:2"]);
        assert_eq!(config.current().map(ToString::to_string).as_deref(), Some("1.21.0"));
        assert_eq!(config.envs_dir(), Path::new("/e"));
        assert!(config.is_dirty());
    }

    #[test]
    fn empty_overrides_leave_config_clean() {
        let temp = TempDir::new().unwrap();
        let resolver = ConfigResolver::new(
            ResolverOptions::exact(temp.path().join("none.toml")),
            defaults(&temp),
        );
        let overrides = ConfigOverrides::default();
        assert!(overrides.is_empty());
        let config = resolver.resolve_with(&overrides).unwrap();
        assert!(!config.is_dirty());
    }

    #[test]
    fn standard_options_start_with_canonical_file() {
        let paths = GomPaths::with_root("/g");
        let options = ResolverOptions::standard(&paths);
        assert_eq!(options.candidates[0], PathBuf::from("/g/gom.toml"));
        assert_eq!(options.candidates[1], Path::new("gom").join("gom.toml"));
        assert_eq!(options.candidates[2], PathBuf::from("gom.toml"));
    }
}
