//! Configuration discovery, resolution and persistence.
//!
//! A [`Config`] is an explicit value: it is built by a [`ConfigResolver`] from
//! the candidate files, adjusted with [`ConfigOverrides`] coming from the
//! command line, passed to the components that need it and written back with
//! [`Config::save`]. There is no process-wide configuration.
//!
//! ## File Format
//!
//! ```toml
//! proxies = ["http://proxy.internal:3128"]
//! envs_dir = "/home/me/.config/gom/envs"
//! config_file = "/home/me/.config/gom/gom.toml"
//! last_update = "2024-05-01T12:00:00Z"
//! current = "1.21.3"
//! ```

mod model;
mod resolver;
mod watch;

pub use model::{CONFIG_KEYS, Config};
pub use resolver::{ConfigOverrides, ConfigResolver, ResolverOptions};
pub use watch::ConfigWatcher;
