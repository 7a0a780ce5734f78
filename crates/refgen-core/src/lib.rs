//! Refgen Core Library
//!
//! Domain logic for managing reference genome assets: a registry of
//! genomes and their assets, a recipe catalog, the build orchestrator and
//! the lifecycle commands built on top of them.

pub mod build;
pub mod checksum;
pub mod commands;
pub mod context;
pub mod error;
pub mod fasta;
pub mod fs;
pub mod recipe;
pub mod registry;
pub mod remote;

pub use error::{RefgenError, Result};

/// Re-exports of commonly used types
pub mod prelude {
    // Registry
    pub use crate::registry::{
        AssetRecord, AssetRef, DEFAULT_TAG, GenomeAttribute, GenomeRecord, Registry,
        RegistryDocument, RegistryPath, RegistryStore, normalize_targets,
    };

    // Build
    pub use crate::build::{
        AssetOutcome, AssetState, BuildOptions, BuildOrchestrator, BuildReport, ShellStepRunner,
        StepJob, StepRunner, StepStatus,
    };

    // Recipes
    pub use crate::recipe::{BuildPackage, Catalog, Template};

    // Checksums and sequences
    pub use crate::checksum::{ContentChecksumTable, GenomeChecksum, compute_genome_checksum};
    pub use crate::fasta::{FastaLine, FastaReader, Locus, SequenceReader};

    // Remote
    pub use crate::remote::{HttpRemoteCatalog, RemoteCatalog, RemoteListing};

    pub use crate::context::AppContext;
    pub use crate::error::{RefgenError, Result};
}
