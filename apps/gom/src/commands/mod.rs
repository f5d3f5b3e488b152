//! Command modules for the gom CLI.
//!
//! ## Release Feed Commands
//!
//! - [`versions`] - List published releases
//! - [`latest`] - Show the newest stable release for a platform
//!
//! ## Environment Commands
//!
//! - [`install`] - Install a release as a new environment
//! - [`use_cmd`] - Switch the active environment
//! - [`list`] - List installed environments
//! - [`current`] - Show the active environment
//! - [`uninstall`] - Remove an environment
//! - [`env`] - Print the `PATH` snippet
//!
//! ## Configuration
//!
//! - [`config`] - Inspect and edit `gom.toml`

pub mod config;
pub mod current;
pub mod env;
pub mod install;
pub mod latest;
pub mod list;
pub mod uninstall;
pub mod use_cmd;
pub mod versions;

use gom_core::{ArtifactKind, TargetTriple};

/// Platform selection flags shared by `latest` and `install`.
#[derive(clap::Args, Debug, Default)]
pub struct TargetArgs {
    /// Target operating system in Go naming (e.g. linux, darwin, windows).
    #[clap(long)]
    pub os: Option<String>,

    /// Target architecture in Go naming (e.g. amd64, arm64).
    #[clap(long)]
    pub arch: Option<String>,

    /// Artifact kind: archive, installer or source.
    #[clap(long)]
    pub kind: Option<ArtifactKind>,
}

impl TargetArgs {
    /// The host triple with the given flags applied.
    pub fn target(&self) -> TargetTriple {
        TargetTriple::host().with_overrides(self.kind, self.os.clone(), self.arch.clone())
    }
}
