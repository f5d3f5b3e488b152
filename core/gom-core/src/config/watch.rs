//! Live reload of a configuration file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError, channel};
use std::time::Duration;

use notify_debouncer_mini::{DebouncedEventKind, Debouncer, new_debouncer};
use tracing::{debug, warn};

use crate::errors::{GomError, Result};

use super::Config;

/// Debounce window for file system events.
const DEBOUNCE_MS: u64 = 200;

/// Watches a configuration file and reloads it on change.
///
/// The parent directory is watched rather than the file itself so that editors
/// replacing the file through a rename are noticed. Each reload is delivered as
/// a `Result<Config>`; the watcher never writes the file.
pub struct ConfigWatcher {
    _debouncer: Debouncer<notify::RecommendedWatcher>,
    receiver: Receiver<Result<Config>>,
    path: PathBuf,
}

impl ConfigWatcher {
    /// Starts watching `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GomError::Io`] if the parent directory cannot be watched.
    pub fn watch(path: &Path) -> Result<Self> {
        let path = path.to_path_buf();
        let file_name: OsString = path
            .file_name()
            .ok_or_else(|| {
                GomError::io_error(
                    format!("{} is not a file path", path.display()),
                    std::io::Error::from(std::io::ErrorKind::InvalidInput),
                )
            })?
            .to_os_string();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, rx) = channel();
        let target = path.clone();
        let mut debouncer = new_debouncer(
            Duration::from_millis(DEBOUNCE_MS),
            move |events: std::result::Result<Vec<notify_debouncer_mini::DebouncedEvent>, _>| {
                match events {
                    Ok(events) => {
                        let touched = events.iter().any(|event| {
                            matches!(event.kind, DebouncedEventKind::Any)
                                && event.path.file_name() == Some(file_name.as_os_str())
                        });
                        if !touched {
                            return;
                        }
                        if !target.is_file() {
                            debug!(path = %target.display(), "watched config file is gone");
                            return;
                        }
                        if let Err(e) = tx.send(Config::load(&target)) {
                            warn!("Failed to deliver reloaded config: {}", e);
                        }
                    }
                    Err(e) => {
                        warn!("Config watch error: {:?}", e);
                    }
                }
            },
        )
        .map_err(|e| watch_error(&dir, e))?;

        debouncer
            .watcher()
            .watch(&dir, notify::RecursiveMode::NonRecursive)
            .map_err(|e| watch_error(&dir, e))?;

        debug!("Started watching {} for changes", path.display());

        Ok(Self {
            _debouncer: debouncer,
            receiver: rx,
            path,
        })
    }

    /// The watched file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Waits for the next reload. Returns `None` once the watcher stopped.
    pub fn recv(&self) -> Option<Result<Config>> {
        self.receiver.recv().ok()
    }

    /// Waits up to `timeout` for the next reload.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Result<Config>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(reloaded) => Some(reloaded),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Returns a pending reload without blocking.
    pub fn try_recv(&self) -> Option<Result<Config>> {
        self.receiver.try_recv().ok()
    }
}

fn watch_error(dir: &Path, err: notify::Error) -> GomError {
    GomError::io_error(
        format!("failed to watch {}", dir.display()),
        std::io::Error::other(err),
    )
}
