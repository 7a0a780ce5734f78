//! Genome config persistence.
//!
//! The registry document is read once per command and rewritten in full on
//! every mutation. Writes go through a temp file and a rename so a crash
//! never leaves a half-written document behind.

use std::fs;
use std::path::{Path, PathBuf};

use semver::{Version, VersionReq};
use tracing::debug;
use url::Url;

use crate::error::{RefgenError, Result};

use super::schema::{RegistryDocument, SUPPORTED_CONFIG_VERSIONS};

/// Loads and saves a [`RegistryDocument`] at a fixed path.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read and validate the document.
    pub fn load(&self) -> Result<RegistryDocument> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RefgenError::MissingGenomeConfig
            } else {
                RefgenError::io(&self.path, e)
            }
        })?;
        let doc: RegistryDocument = toml::from_str(&content)
            .map_err(|e| RefgenError::invalid_config(&self.path, e.to_string()))?;
        validate(&self.path, &doc)?;
        debug!(
            path = %self.path.display(),
            genomes = doc.genomes.len(),
            "loaded genome config"
        );
        Ok(doc)
    }

    /// Save atomically (tmp + rename).
    pub fn save(&self, doc: &RegistryDocument) -> Result<()> {
        // Serialize first so a bad document never truncates the file.
        let content =
            toml::to_string_pretty(doc).map_err(|e| RefgenError::persistence(&self.path, e))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| RefgenError::persistence(&dir, e))?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "genome_config.toml".to_string());
        let tmp_path = dir.join(format!(".{}.{}.tmp", file_name, std::process::id()));

        fs::write(&tmp_path, content).map_err(|e| RefgenError::persistence(&tmp_path, e))?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(RefgenError::persistence(&self.path, e));
        }

        debug!(path = %self.path.display(), "wrote genome config");
        Ok(())
    }
}

fn validate(path: &Path, doc: &RegistryDocument) -> Result<()> {
    let version = Version::parse(&doc.config_version).map_err(|e| {
        RefgenError::invalid_config(
            path,
            format!("config_version '{}' is not valid: {}", doc.config_version, e),
        )
    })?;
    let supported = VersionReq::parse(SUPPORTED_CONFIG_VERSIONS)
        .map_err(|e| RefgenError::invalid_config(path, e.to_string()))?;
    if !supported.matches(&version) {
        return Err(RefgenError::invalid_config(
            path,
            format!(
                "config_version {} is not supported (expected {})",
                version, SUPPORTED_CONFIG_VERSIONS
            ),
        ));
    }

    if doc.genome_folder.as_os_str().is_empty() {
        return Err(RefgenError::invalid_config(path, "genome_folder is empty"));
    }

    Url::parse(&doc.genome_server).map_err(|e| {
        RefgenError::invalid_config(
            path,
            format!("genome_server '{}' is not a URL: {}", doc.genome_server, e),
        )
    })?;

    Ok(())
}
