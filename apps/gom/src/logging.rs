//! Log output setup.
//!
//! Logs go to stderr so command output on stdout stays machine readable.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Set to any non-empty value to emit JSON lines instead of text.
pub const LOG_JSON_ENV: &str = "GOM_LOG_JSON";

const DEFAULT_FILTER: &str = "gom=warn,gom_core=warn";
const DEBUG_FILTER: &str = "gom=debug,gom_core=debug";

/// Installs the global subscriber.
///
/// `--debug` wins over `RUST_LOG`; without either only warnings are shown.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::new(DEBUG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    let json = std::env::var_os(LOG_JSON_ENV).is_some_and(|v| !v.is_empty());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);

    let installed = if json {
        builder.json().without_time().try_init()
    } else {
        builder.compact().without_time().try_init()
    };

    if let Err(e) = installed {
        eprintln!("warning: failed to initialize logging: {e}");
    }
}
