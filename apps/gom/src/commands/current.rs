//! Current command for the gom CLI.
//!
//! Shows the active environment as seen through the alias directory, falling
//! back to the `current` setting of the configuration.

use anyhow::Result;
use gom_core::platform::executable_extension;

use crate::GlobalArgs;
use crate::context::Context;

/// Executes the current command.
///
/// # Errors
///
/// Returns an error if the configuration or environments cannot be read.
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = Context::load(global)?;
    let registry = ctx.registry()?;

    if let Some(env) = registry.current() {
        let go = registry
            .alias_dir()
            .join(format!("go{}", executable_extension()));
        println!("{}", env.name());
        println!("  dir: {}", env.dir().display());
        println!("  go:  {}", go.display());
        return Ok(());
    }

    match ctx.config.current() {
        Some(version) => {
            println!("{version}");
            println!("  (from configuration, no alias links present)");
        }
        None => println!("No environment is active."),
    }
    Ok(())
}
