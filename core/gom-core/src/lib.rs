#![warn(clippy::pedantic)]
//! Core library of the `gom` Go version manager.
//!
//! `gom` keeps several Go toolchains side by side and switches between them by
//! repointing links in a single alias directory, so `PATH` only has to be
//! edited once.
//!
//! ## Overview
//!
//! ```text
//! Bootstrap::detect → ConfigResolver → Config
//!                                        │
//!        HttpFeed → Catalog::fetch → parse → sort → latest / find
//!                                        │
//!              install_artifact → Registry::switch → Config::save
//! ```
//!
//! - [`semver`] parses and orders versions, including Go's `go1.21rc2` labels.
//! - [`catalog`] and [`feed`] retrieve the release feed and pick artifacts.
//! - [`config`] finds, ranks, loads and persists `gom.toml`.
//! - [`envs`] models installed environments and the alias directory.
//! - [`download`], [`verify`] and [`archive`] install a release artifact.
//! - [`shell`] renders the one-time `PATH` snippet.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gom_core::{Bootstrap, Catalog, Config, ConfigResolver, HttpFeed, ResolverOptions, TargetTriple};
//!
//! # async fn run() -> gom_core::Result<()> {
//! let bootstrap = Bootstrap::detect()?;
//! let resolver = ConfigResolver::new(
//!     ResolverOptions::standard(&bootstrap.paths),
//!     Config::from_bootstrap(&bootstrap),
//! );
//! let config = resolver.resolve()?;
//!
//! let feed = HttpFeed::new(config.proxies())?;
//! let mut catalog = Catalog::fetch(&feed).await?.parse().await;
//! catalog.sort();
//! let (release, artifact) = catalog.latest(&TargetTriple::host())?;
//! println!("{} at {}", release.version, artifact.url());
//! # Ok(())
//! # }
//! ```
//!
//! Every fallible operation returns [`Result`] with a [`GomError`].

pub mod archive;
pub mod catalog;
pub mod config;
pub mod download;
pub mod envs;
pub mod errors;
pub mod feed;
pub mod paths;
pub mod platform;
pub mod probe;
pub mod semver;
pub mod shell;
pub mod verify;

pub use catalog::{Catalog, Release, ReleaseArtifact};
pub use config::{Config, ConfigOverrides, ConfigResolver, ConfigWatcher, ResolverOptions};
pub use download::{Downloader, HttpDownloader, install_artifact};
pub use envs::{Environment, Registry};
pub use errors::{GomError, Result};
pub use feed::{HttpFeed, ReleaseFeed};
pub use paths::{EnvMetadata, GomPaths};
pub use platform::{ArtifactKind, TargetTriple};
pub use probe::Bootstrap;
pub use semver::Version;
pub use shell::Shell;
