//! Use command for the gom CLI.
//!
//! Switches the active environment by repointing the alias directory. When
//! the environment name is a version it is also recorded as `current` in the
//! configuration file.
//!
//! ## Usage
//!
//! ```bash
//! gom use 1.21.3
//! gom use my-fork
//! ```

use anyhow::Result;
use clap::Args;
use gom_core::{GomError, Version};

use super::env::print_path_hint;
use crate::GlobalArgs;
use crate::context::Context;

/// Arguments for the use command.
#[derive(Args)]
pub struct UseArgs {
    /// Name of the environment to activate.
    pub name: String,
}

/// Executes the use command.
///
/// # Errors
///
/// Returns an error if the environment does not exist, its links cannot be
/// created or the configuration cannot be saved.
pub fn execute(global: &GlobalArgs, args: &UseArgs) -> Result<()> {
    let mut ctx = Context::load(global)?;
    let mut registry = ctx.registry()?;
    let name = args.name.trim();

    if registry.get(name).is_none() && !registry.env_dir(name)?.is_dir() {
        return Err(GomError::environment_not_found(name).into());
    }

    registry.switch(name)?;

    if let Ok(version) = Version::parse(name) {
        ctx.config.set_current(Some(version));
        ctx.config.save()?;
    }

    println!("Now using {name}.");
    print_path_hint(registry.alias_dir());
    Ok(())
}
