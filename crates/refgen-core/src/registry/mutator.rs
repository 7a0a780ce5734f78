//! In-memory registry with write-through persistence.
//!
//! Every mutating call rewrites the whole document before returning. When a
//! write fails the in-memory copy keeps the change; callers that need the
//! on-disk state back must [`Registry::reload`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{RefgenError, Result};

use super::path::AssetRef;
use super::schema::{AssetRecord, GenomeAttribute, GenomeRecord, RegistryDocument};
use super::store::RegistryStore;

#[derive(Debug, Clone)]
pub struct Registry {
    store: RegistryStore,
    doc: RegistryDocument,
}

impl Registry {
    /// Load the document behind `store`.
    pub fn open(store: RegistryStore) -> Result<Self> {
        let doc = store.load()?;
        Ok(Self { store, doc })
    }

    /// Wrap an already loaded (or freshly created) document.
    pub fn from_document(store: RegistryStore, doc: RegistryDocument) -> Self {
        Self { store, doc }
    }

    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    pub fn document(&self) -> &RegistryDocument {
        &self.doc
    }

    /// Discard in-memory state and re-read the document.
    pub fn reload(&mut self) -> Result<()> {
        self.doc = self.store.load()?;
        Ok(())
    }

    /// Root folder for all genomes. Relative values are anchored at the
    /// config file's directory.
    pub fn genome_folder(&self) -> PathBuf {
        let folder = &self.doc.genome_folder;
        if folder.is_absolute() {
            return folder.clone();
        }
        match self.store.path().parent() {
            Some(parent) => parent.join(folder),
            None => folder.clone(),
        }
    }

    pub fn genome_dir(&self, genome: &str) -> PathBuf {
        self.genome_folder().join(genome)
    }

    pub fn genome_server(&self) -> &str {
        &self.doc.genome_server
    }

    pub fn genomes(&self) -> Vec<String> {
        self.doc.genomes.keys().cloned().collect()
    }

    pub fn genome(&self, genome: &str) -> Result<&GenomeRecord> {
        self.doc
            .genomes
            .get(genome)
            .ok_or_else(|| RefgenError::MissingGenome {
                genome: genome.to_string(),
            })
    }

    pub fn checksum(&self, genome: &str) -> Option<&str> {
        self.doc
            .genomes
            .get(genome)
            .and_then(|g| g.checksum.as_deref())
    }

    pub fn asset_record(&self, asset: &AssetRef) -> Result<&AssetRecord> {
        self.genome(&asset.genome)?
            .asset(&asset.asset, &asset.tag)
            .ok_or_else(|| RefgenError::MissingAsset {
                genome: asset.genome.clone(),
                asset: asset.asset.clone(),
                tag: asset.tag.clone(),
            })
    }

    pub fn has_asset(&self, asset: &AssetRef) -> bool {
        self.asset_record(asset).is_ok()
    }

    /// Absolute local path of a registered asset.
    pub fn asset_path(&self, asset: &AssetRef) -> Result<PathBuf> {
        let record = self.asset_record(asset)?;
        Ok(self.genome_dir(&asset.genome).join(&record.path))
    }

    /// `(asset, tag)` pairs per genome, optionally restricted to one genome.
    pub fn assets_by_genome(
        &self,
        genome: Option<&str>,
    ) -> Result<BTreeMap<String, Vec<(String, String)>>> {
        match genome {
            Some(name) => {
                let record = self.genome(name)?;
                Ok(BTreeMap::from([(name.to_string(), record.asset_tags())]))
            }
            None => Ok(self
                .doc
                .genomes
                .iter()
                .map(|(name, record)| (name.clone(), record.asset_tags()))
                .collect()),
        }
    }

    /// Insert or replace the record for `asset`.
    pub fn upsert_asset(&mut self, asset: &AssetRef, record: AssetRecord) -> Result<()> {
        debug!(asset = %asset, path = %record.path, "upserting asset record");
        self.doc
            .genomes
            .entry(asset.genome.clone())
            .or_default()
            .assets
            .entry(asset.asset.clone())
            .or_default()
            .insert(asset.tag.clone(), record);
        self.persist()
    }

    /// Remove the record for `asset`. Removing an absent record succeeds
    /// without touching storage.
    pub fn remove_asset(&mut self, asset: &AssetRef) -> Result<()> {
        let Some(genome) = self.doc.genomes.get_mut(&asset.genome) else {
            return Ok(());
        };
        let Some(tags) = genome.assets.get_mut(&asset.asset) else {
            return Ok(());
        };
        if tags.remove(&asset.tag).is_none() {
            return Ok(());
        }
        if tags.is_empty() {
            genome.assets.remove(&asset.asset);
        }
        info!(asset = %asset, "removed asset record");
        self.persist()
    }

    pub fn set_genome_attribute(&mut self, genome: &str, attribute: GenomeAttribute) -> Result<()> {
        let record = self.doc.genomes.entry(genome.to_string()).or_default();
        match attribute {
            GenomeAttribute::Checksum(value) => record.checksum = Some(value),
            GenomeAttribute::Description(value) => record.description = Some(value),
        }
        self.persist()
    }

    /// Write the whole document to the store.
    pub fn persist(&self) -> Result<()> {
        self.store.save(&self.doc)
    }

    pub fn config_path(&self) -> &Path {
        self.store.path()
    }
}
