//! Per-run state shared by the commands.

use anyhow::{Context as _, Result};
use gom_core::{
    Bootstrap, Catalog, Config, ConfigResolver, GomError, HttpFeed, Registry, ResolverOptions,
};

use crate::GlobalArgs;

/// The bootstrap facts and the effective configuration of one invocation.
pub struct Context {
    pub bootstrap: Bootstrap,
    pub config: Config,
}

impl Context {
    /// Detects the data directory, resolves the configuration and applies the
    /// command-line overrides.
    ///
    /// When every candidate file is unreadable a warning is logged and the
    /// defaults are used.
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let bootstrap = Bootstrap::detect().context("failed to locate the gom data directory")?;

        let mut defaults = Config::from_bootstrap(&bootstrap);
        let options = match &global.config {
            Some(path) => {
                defaults.set_config_file(path.clone());
                ResolverOptions::exact(path.clone())
            }
            None => ResolverOptions::standard(&bootstrap.paths),
        };
        let resolver = ConfigResolver::new(options, defaults);

        let mut config = match resolver.resolve() {
            Ok(config) => config,
            Err(GomError::NoValidConfig { tried }) => {
                tracing::warn!(
                    tried = ?tried,
                    "no configuration file could be loaded, using defaults"
                );
                resolver.defaults().clone()
            }
            Err(e) => return Err(e).context("failed to resolve the configuration"),
        };
        global.overrides().apply(&mut config);

        Ok(Self { bootstrap, config })
    }

    /// Loads the registry of the configured environments directory.
    pub fn registry(&self) -> Result<Registry> {
        Registry::load(self.config.envs_dir(), &self.bootstrap.paths.alias).with_context(|| {
            format!(
                "failed to read environments in {}",
                self.config.envs_dir().display()
            )
        })
    }

    /// Fetches the release feed and returns it parsed and sorted newest first.
    pub async fn catalog(&self) -> Result<Catalog> {
        let feed = HttpFeed::new(self.config.proxies())?;
        let catalog = Catalog::fetch(&feed)
            .await
            .context("failed to fetch the release feed")?;
        let mut catalog = catalog.parse().await;
        catalog.sort();
        Ok(catalog)
    }
}
