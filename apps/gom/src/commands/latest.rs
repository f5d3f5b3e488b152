//! Latest command for the gom CLI.
//!
//! Prints the newest stable release that ships an artifact for the requested
//! platform, which defaults to this machine.
//!
//! ## Usage
//!
//! ```bash
//! gom latest
//! gom latest --os windows --arch arm64
//! gom latest --kind installer
//! ```

use anyhow::Result;
use clap::Args;

use super::TargetArgs;
use crate::GlobalArgs;
use crate::context::Context;

/// Arguments for the latest command.
#[derive(Args)]
pub struct LatestArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

/// Executes the latest command.
///
/// # Errors
///
/// Returns an error if the feed cannot be fetched or no stable release ships
/// an artifact for the target.
pub async fn execute(global: &GlobalArgs, args: &LatestArgs) -> Result<()> {
    let ctx = Context::load(global)?;
    let target = args.target.target();
    let catalog = ctx.catalog().await?;
    let (release, artifact) = catalog.latest(&target)?;

    let version = release
        .parsed_version()
        .map_or_else(|| release.version.clone(), ToString::to_string);
    println!("{version}");
    println!("  file:   {}", artifact.filename);
    println!("  url:    {}", artifact.url());
    println!("  sha256: {}", artifact.sha256);
    println!("  size:   {} bytes", artifact.size);
    Ok(())
}
