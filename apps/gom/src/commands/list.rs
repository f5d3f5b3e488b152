//! List command for the gom CLI.
//!
//! Displays installed environments and marks the active one.
//!
//! ## Output Format
//!
//! ```text
//! Installed environments:
//!
//!   1.20.10    (installed 3 weeks ago)
//! * 1.21.3     (active, installed yesterday)
//! ```

use anyhow::Result;
use gom_core::Environment;

use crate::GlobalArgs;
use crate::context::Context;

/// Executes the list command.
///
/// # Errors
///
/// Returns an error if the environments directory cannot be read.
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = Context::load(global)?;
    let registry = ctx.registry()?;
    let active = registry.current().map(Environment::name);

    let environments: Vec<&Environment> = registry.environments().collect();
    if environments.is_empty() {
        println!("No environments installed.");
        println!();
        println!("Run 'gom install' to install the latest Go release.");
        return Ok(());
    }

    println!("Installed environments:");
    println!();

    let width = environments.iter().map(|e| e.name().len()).max().unwrap_or(0);
    for env in &environments {
        let is_active = active == Some(env.name());
        let marker = if is_active { "*" } else { " " };

        let mut info_parts = Vec::new();
        if is_active {
            info_parts.push("active".to_string());
        }
        if let Some(meta) = env.metadata() {
            info_parts.push(format!("installed {}", meta.installed_ago()));
        }
        if !env.is_installed() {
            info_parts.push("no bin directory".to_string());
        }

        if info_parts.is_empty() {
            println!("{marker} {}", env.name());
        } else {
            println!(
                "{marker} {:<width$}    ({})",
                env.name(),
                info_parts.join(", ")
            );
        }
    }

    if active.is_none() {
        println!();
        println!("No environment is active. Run 'gom use <name>' to pick one.");
    }

    Ok(())
}
