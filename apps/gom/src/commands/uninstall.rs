//! Uninstall command for the gom CLI.
//!
//! Deletes an environment directory along with the alias links pointing into
//! it. Uninstalling the active environment clears `current`.

use anyhow::{Context as _, Result};
use clap::Args;

use crate::GlobalArgs;
use crate::context::Context;

/// Arguments for the uninstall command.
#[derive(Args)]
pub struct UninstallArgs {
    /// Name of the environment to remove.
    pub name: String,
}

/// Executes the uninstall command.
///
/// # Errors
///
/// Returns an error if the environment does not exist or cannot be deleted.
pub fn execute(global: &GlobalArgs, args: &UninstallArgs) -> Result<()> {
    let mut ctx = Context::load(global)?;
    let mut registry = ctx.registry()?;
    let name = args.name.trim();

    registry
        .remove(name)
        .with_context(|| format!("failed to uninstall {name}"))?;

    let was_current = ctx
        .config
        .current()
        .is_some_and(|current| current.to_string() == name);
    if was_current {
        ctx.config.set_current(None);
        ctx.config.save()?;
    }

    println!("Removed {name}.");
    if was_current {
        println!("No environment is active now. Run 'gom use <name>' to pick one.");
    }
    Ok(())
}
