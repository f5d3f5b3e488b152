//! Named Go environments and the alias directory.
//!
//! Every installed Go toolchain lives in its own environment directory under
//! the environments root. The alias directory is the one directory the user
//! puts on `PATH`; switching environments repoints its links, so no `PATH`
//! edit is needed per switch.
//!
//! ```text
//! envs/
//!   1.20.14/bin/{go,gofmt}
//!   1.21.3/bin/{go,gofmt}
//! bin/                        # alias directory
//!   go    -> envs/1.21.3/bin/go
//!   gofmt -> envs/1.21.3/bin/gofmt
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::errors::{GomError, Result};
use crate::paths::EnvMetadata;
use crate::semver::Version;

/// One named Go installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    name: String,
    dir: PathBuf,
    bin_dir: PathBuf,
}

impl Environment {
    #[must_use]
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            name: name.into(),
            bin_dir: dir.join("bin"),
            dir,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Returns the environment name as a version, when it is one.
    #[must_use]
    pub fn version(&self) -> Option<Version> {
        Version::parse(&self.name).ok()
    }

    /// Reads the installation metadata, if present.
    #[must_use]
    pub fn metadata(&self) -> Option<EnvMetadata> {
        EnvMetadata::read(&self.dir)
    }

    /// Returns whether the environment has a `bin` directory on disk.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.bin_dir.is_dir()
    }
}

/// The set of known environments and the active one.
///
/// The registry is the only place that builds environment paths. It performs
/// no locking; concurrent switches must be serialized by the caller.
#[derive(Debug, Clone)]
pub struct Registry {
    envs_root: PathBuf,
    alias_dir: PathBuf,
    envs: BTreeMap<String, Environment>,
    current: Option<String>,
}

impl Registry {
    /// Creates an empty registry.
    ///
    /// Relative roots are made absolute against the working directory, since
    /// alias links must not resolve relative to the alias directory.
    #[must_use]
    pub fn new(envs_root: impl Into<PathBuf>, alias_dir: impl Into<PathBuf>) -> Self {
        Self {
            envs_root: absolute(envs_root.into()),
            alias_dir: absolute(alias_dir.into()),
            envs: BTreeMap::new(),
            current: None,
        }
    }

    /// Creates a registry populated from the directories under `envs_root`.
    ///
    /// Hidden entries and plain files are skipped. The active environment is
    /// inferred from the alias directory.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::Io`] if `envs_root` exists but cannot be read.
    pub fn load(envs_root: impl Into<PathBuf>, alias_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut registry = Self::new(envs_root, alias_dir);
        if registry.envs_root.is_dir() {
            let entries = std::fs::read_dir(&registry.envs_root).map_err(|e| {
                GomError::io_error(
                    format!("failed to read {}", registry.envs_root.display()),
                    e,
                )
            })?;
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_dir() {
                    continue;
                }
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if name.starts_with('.') {
                    continue;
                }
                let env = Environment::new(name, &path);
                registry.envs.insert(name.to_string(), env);
            }
        }
        registry.current = registry.current_from_alias();
        tracing::debug!(
            envs = registry.envs.len(),
            current = ?registry.current,
            "loaded environment registry"
        );
        Ok(registry)
    }

    #[must_use]
    pub fn envs_root(&self) -> &Path {
        &self.envs_root
    }

    #[must_use]
    pub fn alias_dir(&self) -> &Path {
        &self.alias_dir
    }

    /// Returns the directory an environment called `name` lives in by default.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::InvalidValue`] if `name` is not a single plain path
    /// component.
    pub fn env_dir(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.envs_root.join(name))
    }

    /// Registers an environment.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::EnvironmentExists`] if `name` is already registered
    /// and [`GomError::InvalidValue`] if `name` is not a valid environment name.
    pub fn new_environment(&mut self, name: &str, dir: impl Into<PathBuf>) -> Result<&Environment> {
        validate_name(name)?;
        if self.envs.contains_key(name) {
            return Err(GomError::environment_exists(name));
        }
        let dir = absolute(dir.into());
        Ok(self
            .envs
            .entry(name.to_string())
            .or_insert_with(|| Environment::new(name, dir)))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Environment> {
        self.envs.get(name)
    }

    /// Iterates over the registered environments, ordered by name.
    pub fn environments(&self) -> impl Iterator<Item = &Environment> {
        self.envs.values()
    }

    #[must_use]
    pub fn current(&self) -> Option<&Environment> {
        self.current.as_deref().and_then(|name| self.envs.get(name))
    }

    /// Marks `name` as the active environment.
    ///
    /// An unknown name is registered on the fly with its default directory
    /// under the environments root.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::InvalidValue`] if `name` is not a valid environment
    /// name. Unknown but valid names never fail.
    pub fn set_current(&mut self, name: &str) -> Result<&Environment> {
        let dir = self.env_dir(name)?;
        self.current = Some(name.to_string());
        Ok(self
            .envs
            .entry(name.to_string())
            .or_insert_with(|| Environment::new(name, dir)))
    }

    /// Makes `name` the active environment by repointing the alias directory.
    ///
    /// For every entry of the environment's `bin` directory a same-named link
    /// is created in the alias directory, replacing whatever was there,
    /// including dangling links. Links into other environments that have no
    /// counterpart in the new one are removed. Entries of the alias directory
    /// that point elsewhere are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::SwitchError`] if the `bin` directory cannot be listed
    /// or a link cannot be replaced, and [`GomError::InvalidValue`] for an
    /// invalid name. The active environment only changes on success.
    pub fn switch(&mut self, name: &str) -> Result<()> {
        let env = match self.envs.get(name) {
            Some(env) => env.clone(),
            None => Environment::new(name, self.env_dir(name)?),
        };

        let entries = std::fs::read_dir(env.bin_dir()).map_err(|e| {
            GomError::switch_io_error(
                name,
                format!("cannot list {}", env.bin_dir().display()),
                e,
            )
        })?;
        let binaries: BTreeSet<OsString> = entries
            .map(|entry| entry.map(|e| e.file_name()))
            .collect::<std::io::Result<_>>()
            .map_err(|e| {
                GomError::switch_io_error(
                    name,
                    format!("cannot list {}", env.bin_dir().display()),
                    e,
                )
            })?;

        std::fs::create_dir_all(&self.alias_dir).map_err(|e| {
            GomError::switch_io_error(
                name,
                format!("cannot create {}", self.alias_dir.display()),
                e,
            )
        })?;

        self.remove_stale_links(&binaries)
            .map_err(|e| GomError::switch_io_error(name, "cannot remove stale alias", e))?;

        for binary in &binaries {
            let source = env.bin_dir().join(binary);
            let link = self.alias_dir.join(binary);
            if link.symlink_metadata().is_ok() {
                std::fs::remove_file(&link).map_err(|e| {
                    GomError::switch_io_error(
                        name,
                        format!("cannot replace {}", link.display()),
                        e,
                    )
                })?;
            }
            create_link(&source, &link).map_err(|e| {
                GomError::switch_io_error(
                    name,
                    format!("cannot link {} to {}", link.display(), source.display()),
                    e,
                )
            })?;
        }

        self.set_current(name)?;
        tracing::info!(env = name, links = binaries.len(), "switched environment");
        Ok(())
    }

    /// Infers the active environment from the links in the alias directory.
    #[must_use]
    pub fn current_from_alias(&self) -> Option<String> {
        let entries = std::fs::read_dir(&self.alias_dir).ok()?;
        let mut links: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        links.sort();
        links
            .iter()
            .filter_map(|link| std::fs::read_link(link).ok())
            .find_map(|target| self.owner_of(&target))
    }

    /// Deletes an environment directory and the alias links into it.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::EnvironmentNotFound`] if the environment is neither
    /// registered nor present on disk, [`GomError::InvalidValue`] for an
    /// invalid name and [`GomError::Io`] if it cannot be deleted.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let env = match self.envs.get(name) {
            Some(env) => env.clone(),
            None => Environment::new(name, self.env_dir(name)?),
        };
        if !env.dir().exists() && !self.envs.contains_key(name) {
            return Err(GomError::environment_not_found(name));
        }

        if let Ok(entries) = std::fs::read_dir(&self.alias_dir) {
            for link in entries.flatten().map(|e| e.path()) {
                let points_into_env = std::fs::read_link(&link)
                    .is_ok_and(|target| target.starts_with(env.dir()));
                if points_into_env {
                    std::fs::remove_file(&link).map_err(|e| {
                        GomError::io_error(format!("failed to remove {}", link.display()), e)
                    })?;
                }
            }
        }

        if env.dir().exists() {
            std::fs::remove_dir_all(env.dir()).map_err(|e| {
                GomError::io_error(format!("failed to remove {}", env.dir().display()), e)
            })?;
        }

        self.envs.remove(name);
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        tracing::info!(env = name, "removed environment");
        Ok(())
    }

    /// Returns the name of the environment a link target belongs to.
    fn owner_of(&self, target: &Path) -> Option<String> {
        if let Some(env) = self.envs.values().find(|env| target.starts_with(env.dir())) {
            return Some(env.name().to_string());
        }
        let relative = target.strip_prefix(&self.envs_root).ok()?;
        relative
            .components()
            .next()
            .and_then(|c| c.as_os_str().to_str())
            .map(String::from)
    }

    /// Removes alias links into any environment unless `keep` lists their name.
    fn remove_stale_links(&self, keep: &BTreeSet<OsString>) -> std::io::Result<()> {
        let Ok(entries) = std::fs::read_dir(&self.alias_dir) else {
            return Ok(());
        };
        for entry in entries.flatten() {
            if keep.contains(&entry.file_name()) {
                continue;
            }
            let link = entry.path();
            let Ok(target) = std::fs::read_link(&link) else {
                continue;
            };
            if self.owner_of(&target).is_some() {
                tracing::debug!(link = %link.display(), "removing stale alias");
                std::fs::remove_file(&link)?;
            }
        }
        Ok(())
    }
}

/// Accepts names that are exactly one normal path component.
fn validate_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    );
    if single && !name.contains(['/', '\\']) {
        Ok(())
    } else {
        Err(GomError::invalid_value(
            "name",
            format!("'{name}' is not a valid environment name"),
        ))
    }
}

fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

/// Creates a symbolic link (Unix) or a symlink, hard link or copy (Windows)
/// from `source` to `target`.
fn create_link(source: &Path, target: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    std::os::unix::fs::symlink(source, target)?;

    #[cfg(windows)]
    std::os::windows::fs::symlink_file(source, target)
        .or_else(|_| std::fs::hard_link(source, target))
        .or_else(|_| std::fs::copy(source, target).map(|_| ()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;

    fn install(root: &Path, name: &str, binaries: &[&str]) -> PathBuf {
        let bin = root.join("envs").join(name).join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        for binary in binaries {
            std::fs::write(bin.join(binary), format!("#!/bin/sh\necho {name}\n")).unwrap();
        }
        bin
    }

    fn registry(root: &Path) -> Registry {
        Registry::new(root.join("envs"), root.join("bin"))
    }

    #[test]
    fn new_environment_registers_bin_dir() {
        let mut registry = Registry::new("/e", "/a");
        let env = registry.new_environment("1.21", "/custom/1.21").unwrap();
        assert_eq!(env.dir(), absolute("/custom/1.21".into()));
        assert_eq!(env.bin_dir(), absolute("/custom/1.21/bin".into()));
    }

    #[test]
    fn new_environment_rejects_duplicates() {
        let mut registry = Registry::new("/e", "/a");
        registry.new_environment("1.21", "/x").unwrap();
        let err = registry.new_environment("1.21", "/y").unwrap_err();
        assert!(matches!(err, GomError::EnvironmentExists { ref name } if name == "1.21"));
        assert_eq!(registry.get("1.21").unwrap().dir(), absolute("/x".into()));
    }

    #[test]
    fn set_current_registers_unknown_names() {
        let mut registry = Registry::new("/e", "/a");
        let env = registry.set_current("1.19.2").unwrap();
        assert_eq!(env.dir(), absolute("/e/1.19.2".into()));
        assert_eq!(registry.current().map(Environment::name), Some("1.19.2"));
    }

    #[test]
    fn set_current_keeps_existing_registration() {
        let mut registry = Registry::new("/e", "/a");
        registry.new_environment("dev", "/src/go").unwrap();
        registry.set_current("dev").unwrap();
        assert_eq!(registry.current().unwrap().dir(), absolute("/src/go".into()));
    }

    #[cfg(unix)]
    #[test]
    fn switch_links_every_binary() {
        let temp = TempDir::new().unwrap();
        let bin = install(temp.path(), "1.21", &["go", "gofmt"]);
        let mut registry = registry(temp.path());

        registry.switch("1.21").unwrap();

        let alias = temp.path().join("bin");
        assert_eq!(std::fs::read_link(alias.join("go")).unwrap(), bin.join("go"));
        assert_eq!(std::fs::read_link(alias.join("gofmt")).unwrap(), bin.join("gofmt"));
        assert_eq!(registry.current().map(Environment::name), Some("1.21"));
    }

    #[cfg(unix)]
    #[test]
    fn switch_repoints_links_without_dangling_ones() {
        let temp = TempDir::new().unwrap();
        install(temp.path(), "1.21", &["go", "gofmt"]);
        let bin_120 = install(temp.path(), "1.20", &["go", "gofmt"]);
        let mut registry = registry(temp.path());

        registry.switch("1.21").unwrap();
        registry.switch("1.20").unwrap();

        let alias = temp.path().join("bin");
        let mut names: Vec<_> = std::fs::read_dir(&alias)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        names.sort();
        assert_eq!(names, ["go", "gofmt"]);
        for name in ["go", "gofmt"] {
            let target = std::fs::read_link(alias.join(name)).unwrap();
            assert_eq!(target, bin_120.join(name));
            assert!(alias.join(name).exists(), "{name} dangles");
        }
        assert_eq!(registry.current().map(Environment::name), Some("1.20"));
    }

    #[cfg(unix)]
    #[test]
    fn switch_drops_links_missing_from_target() {
        let temp = TempDir::new().unwrap();
        install(temp.path(), "1.21", &["go", "gofmt", "vet"]);
        install(temp.path(), "1.20", &["go"]);
        let mut registry = registry(temp.path());

        registry.switch("1.21").unwrap();
        registry.switch("1.20").unwrap();

        let alias = temp.path().join("bin");
        assert!(alias.join("go").exists());
        assert!(alias.join("gofmt").symlink_metadata().is_err());
        assert!(alias.join("vet").symlink_metadata().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn switch_replaces_dangling_links_and_keeps_foreign_entries() {
        let temp = TempDir::new().unwrap();
        let bin = install(temp.path(), "1.21", &["go"]);
        let alias = temp.path().join("bin");
        std::fs::create_dir_all(&alias).unwrap();
        std::os::unix::fs::symlink(temp.path().join("nowhere"), alias.join("go")).unwrap();
        std::fs::write(alias.join("mytool"), "").unwrap();

        let mut registry = registry(temp.path());
        registry.switch("1.21").unwrap();

        assert_eq!(std::fs::read_link(alias.join("go")).unwrap(), bin.join("go"));
        assert!(alias.join("mytool").is_file());
    }

    #[test]
    fn switch_fails_without_bin_dir() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry(temp.path());
        registry.set_current("1.20").unwrap();

        let err = registry.switch("1.99").unwrap_err();
        assert!(matches!(err, GomError::SwitchError { ref name, .. } if name == "1.99"));
        assert_eq!(registry.current().map(Environment::name), Some("1.20"));
    }

    #[cfg(unix)]
    #[test]
    fn load_scans_envs_and_reads_current_from_alias() {
        let temp = TempDir::new().unwrap();
        install(temp.path(), "1.21.3", &["go"]);
        install(temp.path(), "1.20.14", &["go"]);
        std::fs::create_dir_all(temp.path().join("envs").join(".partial")).unwrap();
        std::fs::write(temp.path().join("envs").join("stray.txt"), "").unwrap();

        registry(temp.path()).switch("1.21.3").unwrap();

        let loaded = Registry::load(temp.path().join("envs"), temp.path().join("bin")).unwrap();
        let names: Vec<&str> = loaded.environments().map(Environment::name).collect();
        assert_eq!(names, ["1.20.14", "1.21.3"]);
        assert_eq!(loaded.current().map(Environment::name), Some("1.21.3"));
    }

    #[test]
    fn load_of_missing_root_is_empty() {
        let temp = TempDir::new().unwrap();
        let loaded = Registry::load(temp.path().join("envs"), temp.path().join("bin")).unwrap();
        assert_eq!(loaded.environments().count(), 0);
        assert!(loaded.current().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn remove_deletes_directory_and_links() {
        let temp = TempDir::new().unwrap();
        install(temp.path(), "1.21", &["go", "gofmt"]);
        let mut registry = Registry::load(temp.path().join("envs"), temp.path().join("bin")).unwrap();
        registry.switch("1.21").unwrap();

        registry.remove("1.21").unwrap();

        assert!(!temp.path().join("envs").join("1.21").exists());
        assert!(temp.path().join("bin").join("go").symlink_metadata().is_err());
        assert!(registry.current().is_none());
        assert!(registry.get("1.21").is_none());
    }

    #[test]
    fn remove_unknown_environment_fails() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry(temp.path());
        let err = registry.remove("1.0").unwrap_err();
        assert!(matches!(err, GomError::EnvironmentNotFound { .. }));
    }

    #[test]
    fn path_like_names_are_rejected() {
        let temp = TempDir::new().unwrap();
        install(temp.path(), "1.21", &["go"]);
        std::fs::write(temp.path().join("gom.toml"), "envs_dir = \"envs\"\n").unwrap();
        let mut registry = Registry::load(temp.path().join("envs"), temp.path().join("bin")).unwrap();

        for name in ["", ".", "..", "a/b", "../envs", "/tmp"] {
            for err in [
                registry.remove(name).unwrap_err(),
                registry.switch(name).unwrap_err(),
                registry.set_current(name).unwrap_err(),
                registry.env_dir(name).unwrap_err(),
                registry.new_environment(name, "/x").unwrap_err(),
            ] {
                assert!(
                    matches!(err, GomError::InvalidValue { ref key, .. } if key == "name"),
                    "{name:?}: {err}"
                );
            }
        }

        assert!(temp.path().join("envs").join("1.21").join("bin").is_dir());
        assert!(temp.path().join("gom.toml").is_file());
        assert!(registry.current().is_none());
        assert!(temp.path().join("bin").symlink_metadata().is_err());
    }

    #[test]
    fn env_dir_joins_plain_names() {
        let registry = Registry::new("/e", "/a");
        assert_eq!(registry.env_dir("1.21.3").unwrap(), registry.envs_root().join("1.21.3"));
        assert_eq!(registry.env_dir("tip").unwrap(), registry.envs_root().join("tip"));
    }

    #[test]
    #[serial_test::serial]
    fn relative_roots_are_made_absolute() {
        let cwd = std::env::current_dir().unwrap();
        let mut registry = Registry::new("myenvs", "alias");
        assert_eq!(registry.envs_root(), cwd.join("myenvs"));
        assert_eq!(registry.alias_dir(), cwd.join("alias"));

        let env = registry.new_environment("dev", "src/go").unwrap();
        assert_eq!(env.dir(), cwd.join("src/go"));
    }

    #[cfg(unix)]
    #[test]
    #[serial_test::serial]
    fn switch_with_relative_root_leaves_resolvable_links() {
        let temp = TempDir::new().unwrap();
        install(temp.path(), "1.21", &["go", "gofmt"]);
        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(temp.path()).unwrap();

        let mut registry = Registry::new("envs", temp.path().join("alias"));
        let switched = registry.switch("1.21");
        let owner = registry.current_from_alias();
        std::env::set_current_dir(previous).unwrap();

        switched.unwrap();
        let alias = temp.path().join("alias");
        for name in ["go", "gofmt"] {
            let target = std::fs::read_link(alias.join(name)).unwrap();
            assert!(target.is_absolute(), "{}", target.display());
            assert!(alias.join(name).exists(), "{name} dangles");
        }
        assert_eq!(owner.as_deref(), Some("1.21"));
    }

    #[test]
    fn environment_version_parses_name() {
        assert_eq!(
            Environment::new("1.21.3", "/e/1.21.3").version(),
            Some(Version::parse("1.21.3").unwrap())
        );
        assert!(Environment::new("tip", "/e/tip").version().is_none());
    }
}
