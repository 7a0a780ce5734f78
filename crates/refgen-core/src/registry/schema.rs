//! Genome config document schema.
//!
//! ```toml
//! config_version = "0.3.0"
//! genome_folder = "/data/genomes"
//! genome_server = "http://refgenomes.databio.org/"
//!
//! [genomes.hg38]
//! checksum = "4a2f..."
//!
//! [genomes.hg38.assets.fasta.default]
//! path = "fasta/default/hg38.fa"
//! description = "DNA sequences in the FASTA format"
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Config format version written by `init`.
pub const CONFIG_VERSION: &str = "0.3.0";

/// Range of config versions this build can read.
pub const SUPPORTED_CONFIG_VERSIONS: &str = "^0.3";

/// Default remote asset server.
pub const DEFAULT_SERVER: &str = "http://refgenomes.databio.org/";

/// Top-level persisted registry document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryDocument {
    pub config_version: String,
    pub genome_folder: PathBuf,
    pub genome_server: String,
    #[serde(default)]
    pub genomes: BTreeMap<String, GenomeRecord>,
}

impl RegistryDocument {
    pub fn new(genome_folder: PathBuf, genome_server: impl Into<String>) -> Self {
        Self {
            config_version: CONFIG_VERSION.to_string(),
            genome_folder,
            genome_server: genome_server.into(),
            genomes: BTreeMap::new(),
        }
    }
}

/// Per-genome entry: content identity plus its assets by name and tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenomeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub assets: BTreeMap<String, BTreeMap<String, AssetRecord>>,
}

impl GenomeRecord {
    pub fn asset(&self, asset: &str, tag: &str) -> Option<&AssetRecord> {
        self.assets.get(asset).and_then(|tags| tags.get(tag))
    }

    /// Every `(asset, tag)` pair, in name order.
    pub fn asset_tags(&self) -> Vec<(String, String)> {
        self.assets
            .iter()
            .flat_map(|(asset, tags)| tags.keys().map(move |tag| (asset.clone(), tag.clone())))
            .collect()
    }
}

/// One built or inserted asset. Always replaced wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Path relative to the genome directory.
    pub path: String,

    #[serde(default)]
    pub description: String,

    /// Tree hash of the asset output folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,

    /// Recipe inputs the asset was built from.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub build_parameters: BTreeMap<String, String>,
}

impl AssetRecord {
    pub fn new(path: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            description: description.into(),
            digest: None,
            updated: None,
            build_parameters: BTreeMap::new(),
        }
    }

    pub fn with_build_parameters(mut self, params: BTreeMap<String, String>) -> Self {
        self.build_parameters = params;
        self
    }

    pub fn with_digest(mut self, digest: Option<String>) -> Self {
        self.digest = digest;
        self
    }

    pub fn touched(mut self) -> Self {
        self.updated = Some(Utc::now());
        self
    }
}

/// Genome-level attributes settable through the mutator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenomeAttribute {
    Checksum(String),
    Description(String),
}
