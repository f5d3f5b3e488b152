//! Env command for the gom CLI.
//!
//! Prints the snippet that adds the alias directory to `PATH`.
//!
//! ## Usage
//!
//! ```bash
//! eval "$(gom env)"                     # POSIX shells
//! gom env --shell powershell | iex      # PowerShell
//! eval "$(gom env --unset)"             # Undo
//! ```

use std::path::Path;

use anyhow::Result;
use clap::Args;
use gom_core::{GomPaths, Shell};

/// Arguments for the env command.
#[derive(Args)]
pub struct EnvArgs {
    /// Shell dialect: posix or powershell. Defaults to the platform's shell.
    #[clap(long)]
    pub shell: Option<Shell>,

    /// Print the snippet that removes the alias directory instead.
    #[clap(long)]
    pub unset: bool,
}

/// Executes the env command.
///
/// # Errors
///
/// Returns an error if the data directory cannot be determined.
pub fn execute(args: &EnvArgs) -> Result<()> {
    let paths = GomPaths::new()?;
    let shell = args.shell.unwrap_or_else(Shell::detect);
    let snippet = if args.unset {
        shell.path_unsetter(&paths.alias)
    } else {
        shell.path_setter(&paths.alias)
    };
    println!("{snippet}");
    Ok(())
}

/// Returns whether `dir` is one of the entries of `PATH`.
pub fn is_on_path(dir: &Path) -> bool {
    std::env::var_os("PATH")
        .is_some_and(|path| std::env::split_paths(&path).any(|entry| entry == dir))
}

/// Tells the user how to put the alias directory on `PATH` when it is missing.
pub fn print_path_hint(alias_dir: &Path) {
    if is_on_path(alias_dir) {
        return;
    }
    println!();
    println!("{} is not on your PATH. Add it with:", alias_dir.display());
    if Shell::detect() == Shell::PowerShell {
        println!("  gom env --shell powershell | Invoke-Expression");
    } else {
        println!("  eval \"$(gom env)\"");
    }
}
