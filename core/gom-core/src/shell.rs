//! Shell snippets that put the alias directory on `PATH`.
//!
//! Switching environments only repoints links inside the alias directory, so
//! `PATH` has to be edited once. `gom env` prints the snippet for the user to
//! evaluate or append to a profile.
//!
//! POSIX shells:
//! ```sh
//! case ":$PATH:" in *":/home/me/.config/gom/bin:"*) ;; *) export PATH="/home/me/.config/gom/bin:$PATH" ;; esac
//! ```
//!
//! PowerShell persists the change for the current user:
//! ```powershell
//! if (-NOT $env:PATH.Split(';').Contains('C:\Users\me\gom\bin')) { ... }
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::errors::GomError;

/// Shell dialect of a snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    /// sh, bash, zsh, dash and friends.
    Posix,
    PowerShell,
}

impl Shell {
    /// Picks the dialect for the running platform.
    ///
    /// PowerShell on Windows, POSIX everywhere else.
    #[must_use]
    pub fn detect() -> Self {
        if cfg!(windows) {
            Self::PowerShell
        } else {
            Self::Posix
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Posix => "posix",
            Self::PowerShell => "powershell",
        }
    }

    /// Renders the snippet adding `dir` to `PATH` unless it is already there.
    ///
    /// POSIX shells get `dir` prepended for the session so the alias links win
    /// over a system Go. PowerShell appends it to the persistent user `Path`.
    #[must_use]
    pub fn path_setter(self, dir: &Path) -> String {
        match self {
            Self::Posix => {
                let dir = escape_posix(dir);
                format!(
                    "case \":$PATH:\" in *\":{dir}:\"*) ;; *) export PATH=\"{dir}:$PATH\" ;; esac"
                )
            }
            Self::PowerShell => {
                let dir = escape_powershell(dir);
                format!(
                    "if (-NOT $env:PATH.Split(';').Contains('{dir}')) {{ \
                     [Environment]::SetEnvironmentVariable('Path', \
                     [Environment]::GetEnvironmentVariable('Path', [EnvironmentVariableTarget]::User) + ';{dir}', \
                     [EnvironmentVariableTarget]::User) }}"
                )
            }
        }
    }

    /// Renders the snippet removing `dir` from `PATH`.
    #[must_use]
    pub fn path_unsetter(self, dir: &Path) -> String {
        match self {
            Self::Posix => {
                let dir = escape_posix(dir);
                format!(
                    "_gom_dir=\"{dir}\"; PATH=\":$PATH:\"; PATH=\"${{PATH//\":$_gom_dir:\"/:}}\"; \
                     PATH=\"${{PATH#:}}\"; export PATH=\"${{PATH%:}}\"; unset _gom_dir"
                )
            }
            Self::PowerShell => {
                let dir = escape_powershell(dir);
                format!(
                    "[Environment]::SetEnvironmentVariable('Path', \
                     [Environment]::GetEnvironmentVariable('Path', [EnvironmentVariableTarget]::User).Replace(';{dir}', ''), \
                     [EnvironmentVariableTarget]::User)"
                )
            }
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shell {
    type Err = GomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "posix" | "sh" | "bash" | "zsh" => Ok(Self::Posix),
            "powershell" | "pwsh" => Ok(Self::PowerShell),
            other => Err(GomError::invalid_value(
                "shell",
                format!("unsupported shell '{other}', expected posix or powershell"),
            )),
        }
    }
}

/// Escapes characters that are special inside double quotes.
fn escape_posix(dir: &Path) -> String {
    dir.display()
        .to_string()
        .replace('\\', "\\\\")
        .replace('$', "\\$")
        .replace('`', "\\`")
        .replace('"', "\\\"")
}

/// Doubles single quotes, the only escape inside a PowerShell literal string.
fn escape_powershell(dir: &Path) -> String {
    dir.display().to_string().replace('\'', "''")
}
