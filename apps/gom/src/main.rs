#![warn(clippy::pedantic)]

//! # gom
//!
//! `gom` installs Go toolchains side by side and switches between them by
//! repointing the links in one alias directory. Add that directory to `PATH`
//! once (`gom env`) and every `gom use` takes effect immediately.
//!
//! ## Subcommands
//!
//! - `versions` - List releases published on the release feed
//! - `latest` - Show the newest stable release for a platform
//! - `install` - Download and unpack a release into a new environment
//! - `use` - Make an environment the active one
//! - `list` - List installed environments
//! - `current` - Show the active environment
//! - `uninstall` - Remove an environment
//! - `env` - Print the shell snippet that puts the alias directory on `PATH`
//! - `config` - Inspect and edit `gom.toml`
//!
//! ## Examples
//!
//! ```bash
//! gom install latest
//! gom use 1.21.3
//! eval "$(gom env)"
//! ```

mod commands;
mod context;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{config, current, env, install, latest, list, uninstall, use_cmd, versions};
use gom_core::{ConfigOverrides, Version};

/// Go toolchain version manager.
#[derive(Parser)]
#[command(
    name = "gom",
    author,
    version,
    about = "Install and switch between Go toolchains",
    after_help = "\
CONFIGURATION:
    Unless --config is given, gom reads the newest of these files:
    1. $GOM_HOME/gom.toml (or the default data directory)
    2. ./gom/gom.toml
    3. ./gom.toml
    4. gom.toml in the user configuration directory

ENVIRONMENT VARIABLES:
    GOM_HOME            Data directory (environments, alias links, config)
    GOM_DIST_SERVER     Release feed URL (default: https://go.dev/dl/?mode=json&include=all)
    GOM_LOG_JSON        Emit logs as JSON lines
    RUST_LOG            Log filter (e.g. gom_core=debug)"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags accepted by every subcommand. Each one overrides the resolved
/// configuration for this run.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Read the configuration from this file only.
    #[clap(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Comma-separated proxy URLs, replacing the configured list.
    #[clap(long, global = true, value_delimiter = ',', value_name = "URLS")]
    pub proxies: Option<Vec<String>>,

    /// Directory holding the environments.
    #[clap(long, global = true, value_name = "DIR")]
    pub envs_dir: Option<PathBuf>,

    /// Version to record as the active one.
    #[clap(long, global = true, value_name = "VERSION")]
    pub current: Option<Version>,

    /// Enable debug logging.
    #[clap(long, global = true, action = clap::ArgAction::SetTrue)]
    pub debug: bool,
}

impl GlobalArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            proxies: self.proxies.clone(),
            envs_dir: self.envs_dir.clone(),
            config_file: None,
            current: self.current.clone(),
        }
    }
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// List releases published on the release feed.
    ///
    /// Releases are shown newest first. Those marked with `*` ship an archive
    /// for this machine.
    Versions(versions::VersionsArgs),

    /// Show the newest stable release that ships an artifact for a platform.
    Latest(latest::LatestArgs),

    /// Download, verify and unpack a release into a new environment.
    ///
    /// The first installed environment becomes the active one.
    Install(install::InstallArgs),

    /// Make an environment the active one.
    ///
    /// Repoints the links in the alias directory at the environment's `bin`
    /// directory.
    Use(use_cmd::UseArgs),

    /// List installed environments.
    List,

    /// Show the active environment.
    Current,

    /// Remove an environment.
    Uninstall(uninstall::UninstallArgs),

    /// Print the shell snippet that adds the alias directory to `PATH`.
    Env(env::EnvArgs),

    /// Inspect and edit the configuration.
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

/// Prints the error chain and returns the exit code.
fn handle_error(e: &anyhow::Error) -> i32 {
    eprintln!("Error: {e:?}");
    1
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.global.debug);

    match cli.command {
        Commands::Versions(args) => versions::execute(&cli.global, &args).await,
        Commands::Latest(args) => latest::execute(&cli.global, &args).await,
        Commands::Install(args) => install::execute(&cli.global, &args).await,
        Commands::Use(args) => use_cmd::execute(&cli.global, &args),
        Commands::List => list::execute(&cli.global),
        Commands::Current => current::execute(&cli.global),
        Commands::Uninstall(args) => uninstall::execute(&cli.global, &args),
        Commands::Env(args) => env::execute(&args),
        Commands::Config(args) => config::execute(&cli.global, &args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "gom",
            "list",
            "--proxies",
            "http://a:1,http://b:2",
            "--current",
            "1.21",
        ])
        .unwrap();
        let overrides = cli.global.overrides();
        assert_eq!(
            overrides.proxies,
            Some(vec!["http://a:1".to_string(), "http://b:2".to_string()])
        );
        assert_eq!(
            overrides.current.map(|v| v.to_string()),
            Some("1.21.0".to_string())
        );
        assert!(overrides.envs_dir.is_none());
    }

    #[test]
    fn invalid_current_is_rejected_by_the_parser() {
        assert!(Cli::try_parse_from(["gom", "list", "--current", "banana"]).is_err());
    }
}
