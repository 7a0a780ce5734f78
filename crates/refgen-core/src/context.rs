//! Application context: locates the genome config and hands out the
//! services commands need.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::build::ShellStepRunner;
use crate::error::{RefgenError, Result};
use crate::recipe::Catalog;
use crate::registry::{Registry, RegistryStore};
use crate::remote::HttpRemoteCatalog;

/// Environment variable naming the genome config file.
pub const CONFIG_ENV_VAR: &str = "REFGEN_CONFIG";

pub const CONFIG_FILE_NAME: &str = "genome_config.toml";

/// Pick the genome config path: explicit flag, then `$REFGEN_CONFIG`, then
/// `<config_dir>/refgen/genome_config.toml`.
pub fn select_config_path(
    flag: Option<&Path>,
    env_value: Option<OsString>,
    config_dir: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }
    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(value));
    }
    config_dir
        .map(|dir| dir.join("refgen").join(CONFIG_FILE_NAME))
        .ok_or(RefgenError::MissingGenomeConfig)
}

/// Shared state for one command invocation.
#[derive(Debug, Clone)]
pub struct AppContext {
    config_path: PathBuf,
    catalog: Catalog,
}

impl AppContext {
    /// Context over an explicit config path with the built-in catalog.
    pub fn new(config_path: PathBuf) -> Result<Self> {
        Ok(Self::with_catalog(config_path, Catalog::builtin()?))
    }

    /// Context with a custom catalog (for testing).
    pub fn with_catalog(config_path: PathBuf, catalog: Catalog) -> Self {
        Self {
            config_path,
            catalog,
        }
    }

    /// Resolve the config path from the flag and the process environment.
    pub fn from_env(flag: Option<&Path>) -> Result<Self> {
        let path = select_config_path(flag, std::env::var_os(CONFIG_ENV_VAR), dirs::config_dir())?;
        debug!(config = %path.display(), "selected genome config");
        Self::new(path)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn registry_store(&self) -> RegistryStore {
        RegistryStore::new(self.config_path.clone())
    }

    /// Load the registry; the config file must already exist.
    pub fn open_registry(&self) -> Result<Registry> {
        Registry::open(self.registry_store())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn step_runner(&self) -> ShellStepRunner {
        ShellStepRunner::new()
    }

    /// Remote catalog at the registry's configured server.
    pub fn remote_catalog(&self, registry: &Registry) -> Result<HttpRemoteCatalog> {
        HttpRemoteCatalog::new(registry.genome_server())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_env_and_default() {
        let path = select_config_path(
            Some(Path::new("/flag/genome_config.toml")),
            Some(OsString::from("/env/genome_config.toml")),
            Some(PathBuf::from("/home/u/.config")),
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/flag/genome_config.toml"));
    }

    #[test]
    fn env_wins_over_default() {
        let path = select_config_path(
            None,
            Some(OsString::from("/env/genome_config.toml")),
            Some(PathBuf::from("/home/u/.config")),
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/env/genome_config.toml"));
    }

    #[test]
    fn empty_env_falls_back_to_config_dir() {
        let path =
            select_config_path(None, Some(OsString::new()), Some(PathBuf::from("/home/u/.config")))
                .unwrap();
        assert_eq!(path, PathBuf::from("/home/u/.config/refgen/genome_config.toml"));
    }

    #[test]
    fn nothing_to_select_is_an_error() {
        assert!(matches!(
            select_config_path(None, None, None),
            Err(RefgenError::MissingGenomeConfig)
        ));
    }
}
