//! Config command for the gom CLI.
//!
//! ## Usage
//!
//! ```bash
//! gom config init               # Write a default gom.toml into the data directory
//! gom config get                # Print every setting
//! gom config get envs_dir       # Print one setting
//! gom config set proxies http://proxy:3128,http://backup:3128
//! gom config path               # Print the file the settings came from
//! gom config watch              # Print the settings whenever the file changes
//! ```

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::{Args, Subcommand};
use gom_core::config::CONFIG_KEYS;
use gom_core::{Config, ConfigWatcher};

use crate::GlobalArgs;
use crate::context::Context;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Create a default configuration file.
    Init {
        /// Directory to initialize. Defaults to the gom data directory.
        #[clap(long)]
        dir: Option<PathBuf>,

        /// Overwrite an existing file.
        #[clap(long)]
        force: bool,
    },

    /// Print one setting, or all of them.
    Get {
        /// One of proxies, envs_dir, config_file, last_update, current.
        key: Option<String>,
    },

    /// Change a setting and save the file.
    Set {
        key: String,
        /// New value. Proxies are comma-separated; an empty current clears it.
        value: String,
    },

    /// Print the path of the configuration file in use.
    Path,

    /// Print the settings every time the configuration file changes.
    Watch,
}

/// Executes the config command.
///
/// # Errors
///
/// Returns an error for unknown keys, invalid values and files that cannot be
/// read, written or watched.
pub async fn execute(global: &GlobalArgs, args: &ConfigArgs) -> Result<()> {
    match &args.command {
        ConfigCommand::Init { dir, force } => init(global, dir.as_ref(), *force),
        ConfigCommand::Get { key } => get(global, key.as_deref()),
        ConfigCommand::Set { key, value } => set(global, key, value),
        ConfigCommand::Path => {
            let ctx = Context::load(global)?;
            println!("{}", ctx.config.config_file().display());
            Ok(())
        }
        ConfigCommand::Watch => watch(global).await,
    }
}

fn init(global: &GlobalArgs, dir: Option<&PathBuf>, force: bool) -> Result<()> {
    let ctx = Context::load(global)?;
    let dir = dir.cloned().unwrap_or_else(|| ctx.bootstrap.paths.root.clone());
    let file = dir.join(gom_core::paths::CONFIG_FILE_NAME);
    if file.exists() && !force {
        bail!(
            "{} already exists, pass --force to overwrite it",
            file.display()
        );
    }

    let config = Config::init(&dir, ctx.bootstrap.runtime.clone())?;
    println!("Wrote {}", config.config_file().display());
    Ok(())
}

fn get(global: &GlobalArgs, key: Option<&str>) -> Result<()> {
    let ctx = Context::load(global)?;
    match key {
        Some(key) => println!("{}", ctx.config.get(key)?),
        None => {
            for key in CONFIG_KEYS {
                println!("{key} = {}", ctx.config.get(key)?);
            }
        }
    }
    Ok(())
}

fn set(global: &GlobalArgs, key: &str, value: &str) -> Result<()> {
    let mut ctx = Context::load(global)?;
    ctx.config.set(key, value)?;
    ctx.config
        .save()
        .with_context(|| format!("failed to save {key}"))?;
    println!("{key} = {}", ctx.config.get(key)?);
    Ok(())
}

async fn watch(global: &GlobalArgs) -> Result<()> {
    let ctx = Context::load(global)?;
    let path = ctx.config.config_file().to_path_buf();
    if !path.is_file() {
        bail!(
            "{} does not exist, run 'gom config init' first",
            path.display()
        );
    }

    let watcher = ConfigWatcher::watch(&path)?;
    println!("Watching {} (Ctrl-C to stop)", path.display());

    tokio::task::spawn_blocking(move || {
        while let Some(reloaded) = watcher.recv() {
            match reloaded {
                Ok(config) => print_settings(&config),
                Err(e) => eprintln!("warning: {e}"),
            }
        }
    })
    .await
    .context("config watcher stopped unexpectedly")
}

fn print_settings(config: &Config) {
    println!("reloaded {}", config.config_file().display());
    for key in CONFIG_KEYS {
        if let Ok(value) = config.get(key) {
            println!("  {key} = {value}");
        }
    }
}
