//! Install command for the gom CLI.
//!
//! Downloads a Go release, verifies it against the digest and size published
//! on the feed and unpacks it into `envs_dir/<version>`. When no environment is
//! active yet, the new one is switched to.
//!
//! ## Usage
//!
//! ```bash
//! gom install            # Latest stable release for this machine
//! gom install 1.21.3     # A specific release
//! gom install go1.22rc1  # Go labels are accepted as well
//! ```

use anyhow::{Context as _, Result};
use clap::Args;
use gom_core::{
    Catalog, GomError, HttpDownloader, Release, ReleaseArtifact, TargetTriple, Version,
    install_artifact,
};

use super::TargetArgs;
use super::env::print_path_hint;
use crate::GlobalArgs;
use crate::context::Context;

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Version to install (e.g. "1.21.3", "go1.21.3" or "latest").
    #[clap(default_value = "latest")]
    pub version: String,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// Executes the install command.
///
/// # Process
///
/// 1. Fetch, parse and sort the release feed
/// 2. Pick the release and the artifact for the target
/// 3. Download, verify and extract into a new environment
/// 4. Switch to it when no environment is active
///
/// # Errors
///
/// Returns an error if the feed cannot be fetched, the release or artifact
/// does not exist, or any installation step fails.
pub async fn execute(global: &GlobalArgs, args: &InstallArgs) -> Result<()> {
    let mut ctx = Context::load(global)?;
    let paths = ctx.bootstrap.paths.clone();
    paths.ensure_directories()?;

    let target = args.target.target();
    println!("Fetching release feed...");
    let catalog = ctx.catalog().await?;
    let (release, artifact) = select(&catalog, &args.version, &target)?;
    let version = match release.parsed_version() {
        Some(version) => version.clone(),
        None => Version::from_go(&release.version)?,
    };
    let name = version.to_string();

    let mut registry = ctx.registry()?;
    let env_dir = registry.env_dir(&name)?;

    if env_dir.exists() {
        println!("Go {name} is already installed.");
    } else {
        println!("Installing Go {name} for {target}...");
        println!("Downloading {}...", artifact.url());
        let downloader = HttpDownloader::new(ctx.config.proxies())?;
        install_artifact(&downloader, artifact, &paths.downloads, &env_dir)
            .await
            .with_context(|| format!("failed to install Go {name}"))?;
        registry.new_environment(&name, &env_dir)?;
        println!("Go {name} installed to {}.", env_dir.display());
    }

    if registry.current().is_none() {
        registry.switch(&name)?;
        ctx.config.set_current(Some(version));
        ctx.config.save()?;
        println!("Now using Go {name}.");
        print_path_hint(&paths.alias);
    } else if registry.current().map(gom_core::Environment::name) != Some(name.as_str()) {
        println!("Run 'gom use {name}' to switch to it.");
    }

    Ok(())
}

/// Resolves the requested version to a release and its artifact.
fn select<'a>(
    catalog: &'a Catalog,
    requested: &str,
    target: &TargetTriple,
) -> Result<(&'a Release, &'a ReleaseArtifact), GomError> {
    if requested == "latest" {
        return catalog.latest(target);
    }

    let version = parse_requested(requested)?;
    let release = catalog
        .find(&version)
        .ok_or_else(|| GomError::release_not_found(version.to_string()))?;
    let artifact = release
        .select_artifact(target)
        .ok_or_else(|| GomError::no_matching_artifact(target))?;
    Ok((release, artifact))
}

fn parse_requested(requested: &str) -> Result<Version, GomError> {
    if requested.starts_with("go") {
        Version::from_go(requested)
    } else {
        Version::parse(requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gom_core::ArtifactKind;

    fn archive(version: &str, os: &str, arch: &str) -> ReleaseArtifact {
        ReleaseArtifact {
            filename: format!("{version}.{os}-{arch}.tar.gz"),
            os: os.to_string(),
            arch: arch.to_string(),
            version: version.to_string(),
            sha256: String::new(),
            size: 0,
            kind: ArtifactKind::Archive,
        }
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new(vec![
            Release::new("go1.22rc1", false, vec![archive("go1.22rc1", "linux", "amd64")]),
            Release::new("go1.21.3", true, vec![archive("go1.21.3", "linux", "amd64")]),
            Release::new("go1.20.10", true, vec![archive("go1.20.10", "darwin", "arm64")]),
        ]);
        catalog.sort();
        catalog
    }

    fn linux() -> TargetTriple {
        TargetTriple::new(ArtifactKind::Archive, "linux", "amd64")
    }

    #[test]
    fn latest_picks_newest_stable() {
        let catalog = catalog();
        let (release, _) = select(&catalog, "latest", &linux()).unwrap();
        assert_eq!(release.version, "go1.21.3");
    }

    #[test]
    fn go_labels_and_plain_versions_both_resolve() {
        let catalog = catalog();
        let (release, artifact) = select(&catalog, "go1.22rc1", &linux()).unwrap();
        assert_eq!(release.version, "go1.22rc1");
        assert_eq!(artifact.filename, "go1.22rc1.linux-amd64.tar.gz");

        let (release, _) = select(&catalog, "1.21.3", &linux()).unwrap();
        assert_eq!(release.version, "go1.21.3");
    }

    #[test]
    fn unknown_release_and_missing_artifact_are_distinct_errors() {
        let catalog = catalog();
        assert!(matches!(
            select(&catalog, "1.19.0", &linux()),
            Err(GomError::ReleaseNotFound { .. })
        ));
        assert!(matches!(
            select(&catalog, "1.20.10", &linux()),
            Err(GomError::NoMatchingArtifact { .. })
        ));
        assert!(matches!(
            select(&catalog, "nope", &linux()),
            Err(GomError::InvalidVersion { .. })
        ));
    }
}
