//! Genome registry: the persisted record of genomes, their assets and
//! checksums.

pub mod mutator;
pub mod path;
pub mod schema;
pub mod store;

pub use mutator::Registry;
pub use path::{AssetRef, DEFAULT_TAG, RegistryPath, normalize_targets};
pub use schema::{
    AssetRecord, CONFIG_VERSION, DEFAULT_SERVER, GenomeAttribute, GenomeRecord, RegistryDocument,
};
pub use store::RegistryStore;
