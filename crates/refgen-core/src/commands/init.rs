//! Create a new genome config.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{RefgenError, Result};
use crate::fs::ensure_writable;
use crate::registry::{DEFAULT_SERVER, RegistryDocument, RegistryStore};

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub config_path: PathBuf,
    /// Defaults to [`DEFAULT_SERVER`].
    pub genome_server: Option<String>,
}

impl InitOptions {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            genome_server: None,
        }
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.genome_server = Some(server.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Created(PathBuf),
    /// An existing file was left untouched.
    AlreadyExists(PathBuf),
}

/// Write a fresh document whose genome folder is the config's directory.
pub fn init(options: &InitOptions) -> Result<InitOutcome> {
    let path = &options.config_path;
    if path.exists() {
        warn!(config = %path.display(), "can't initialize, file exists");
        return Ok(InitOutcome::AlreadyExists(path.clone()));
    }

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return Err(RefgenError::MissingFolder {
            path: parent.to_path_buf(),
        });
    }
    ensure_writable(parent)?;
    let genome_folder = fs::canonicalize(parent).map_err(|e| RefgenError::io(parent, e))?;

    let server = options.genome_server.as_deref().unwrap_or(DEFAULT_SERVER);
    url::Url::parse(server)
        .map_err(|e| RefgenError::invalid_config(path, format!("genome_server '{}': {}", server, e)))?;

    RegistryStore::new(path.clone()).save(&RegistryDocument::new(genome_folder, server))?;
    info!(config = %path.display(), "wrote new genome config");
    Ok(InitOutcome::Created(path.clone()))
}
