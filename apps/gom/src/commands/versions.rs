//! Versions command for the gom CLI.
//!
//! Lists the releases published on the release feed, newest first.
//!
//! ## Usage
//!
//! ```bash
//! gom versions           # All releases
//! gom versions --stable  # Stable releases only
//! gom versions --json    # Machine readable output
//! ```
//!
//! ## Output Format
//!
//! ```text
//! Available Go releases:
//!
//!   1.22.0-rc1 (unstable) [darwin/arm64, linux/amd64]
//!   1.21.3     (stable)   [darwin/arm64, linux/amd64] *
//!
//!   * = available for linux/amd64
//! ```

use anyhow::Result;
use clap::Args;
use gom_core::{Catalog, Release, TargetTriple};
use serde::Serialize;

use crate::GlobalArgs;
use crate::context::Context;

/// Arguments for the versions command.
#[derive(Args)]
pub struct VersionsArgs {
    /// Show only stable releases.
    #[clap(long, short = 's')]
    pub stable: bool,

    /// Print JSON instead of text.
    #[clap(long, short = 'j')]
    pub json: bool,
}

/// One release in JSON output.
#[derive(Debug, Clone, Serialize)]
struct VersionInfo {
    version: String,
    label: String,
    stable: bool,
    platforms: Vec<String>,
    available_for_current: bool,
}

impl VersionInfo {
    fn from_release(release: &Release, host: &TargetTriple) -> Self {
        Self {
            version: display_version(release),
            label: release.version.clone(),
            stable: release.stable,
            platforms: release.platforms(),
            available_for_current: release.select_artifact(host).is_some(),
        }
    }
}

/// Executes the versions command.
///
/// # Errors
///
/// Returns an error if the release feed cannot be fetched or decoded.
pub async fn execute(global: &GlobalArgs, args: &VersionsArgs) -> Result<()> {
    let ctx = Context::load(global)?;
    let mut catalog = ctx.catalog().await?;
    if args.stable {
        catalog = catalog.only_stable();
    }

    let host = TargetTriple::host();
    if args.json {
        output_json(&catalog, &host)
    } else {
        output_text(&catalog, &host, args.stable);
        Ok(())
    }
}

fn output_json(catalog: &Catalog, host: &TargetTriple) -> Result<()> {
    let infos: Vec<VersionInfo> = catalog
        .iter()
        .map(|release| VersionInfo::from_release(release, host))
        .collect();
    println!("{}", serde_json::to_string_pretty(&infos)?);
    Ok(())
}

fn output_text(catalog: &Catalog, host: &TargetTriple, stable_only: bool) {
    if catalog.is_empty() {
        if stable_only {
            println!("No stable releases available.");
        } else {
            println!("No releases available.");
        }
        return;
    }

    println!("Available Go releases:");
    println!();

    let width = catalog
        .iter()
        .map(|r| display_version(r).len())
        .max()
        .unwrap_or(0);

    for release in catalog {
        let stability = if release.stable {
            "(stable)  "
        } else {
            "(unstable)"
        };
        let platforms = release.platforms();
        let platform_list = if platforms.is_empty() {
            String::new()
        } else {
            format!(" [{}]", platforms.join(", "))
        };
        let marker = if release.select_artifact(host).is_some() {
            " *"
        } else {
            ""
        };
        println!(
            "  {:<width$} {stability}{platform_list}{marker}",
            display_version(release)
        );
    }

    println!();
    println!("  * = available for {}/{}", host.os, host.arch);
}

fn display_version(release: &Release) -> String {
    release
        .parsed_version()
        .map_or_else(|| release.version.clone(), ToString::to_string)
}
