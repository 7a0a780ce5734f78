//! Retrieve a subsequence from a genome's primary sequence asset.

use tracing::debug;

use crate::error::Result;
use crate::fasta::{FastaReader, Locus, SequenceReader};
use crate::fs::ensure_readable;
use crate::recipe::PRIMARY_ASSET;
use crate::registry::{AssetRef, Registry};

/// Sequence at `locus` (`chr` or `chr:start-end`, 0-based, end-exclusive).
pub fn getseq(registry: &Registry, genome: &str, locus: &str) -> Result<String> {
    let locus = Locus::parse(locus)?;
    let path = registry.asset_path(&AssetRef::with_default_tag(genome, PRIMARY_ASSET))?;
    ensure_readable(&path)?;
    debug!(genome, locus = %locus, fasta = %path.display(), "fetching sequence");
    FastaReader::open(path)?.fetch(&locus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RefgenError;
    use crate::registry::{AssetRecord, DEFAULT_SERVER, RegistryDocument, RegistryStore};
    use std::fs;
    use tempfile::TempDir;

    fn registry_with_fasta(temp: &TempDir, create: bool) -> Registry {
        let folder = temp.path().join("genomes");
        let fasta = folder.join("hg38/fasta/default/hg38.fa");
        fs::create_dir_all(fasta.parent().unwrap()).unwrap();
        if create {
            fs::write(&fasta, ">chr1\nACGTACGT\n").unwrap();
        }
        let store = RegistryStore::new(temp.path().join("genome_config.toml"));
        let mut doc = RegistryDocument::new(folder, DEFAULT_SERVER);
        doc.genomes.entry("hg38".into()).or_default().assets.insert(
            PRIMARY_ASSET.into(),
            [("default".to_string(), AssetRecord::new("fasta/default/hg38.fa", ""))].into(),
        );
        Registry::from_document(store, doc)
    }

    #[test]
    fn slices_registered_fasta() {
        let temp = TempDir::new().unwrap();
        let registry = registry_with_fasta(&temp, true);
        assert_eq!(getseq(&registry, "hg38", "chr1:2-5").unwrap(), "GTA");
    }

    #[test]
    fn missing_file_is_reported_by_path() {
        let temp = TempDir::new().unwrap();
        let registry = registry_with_fasta(&temp, false);
        let err = getseq(&registry, "hg38", "chr1").unwrap_err();
        assert!(matches!(err, RefgenError::MissingPath { .. }), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_fasta_is_a_permission_error() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let registry = registry_with_fasta(&temp, true);
        let fasta = registry
            .asset_path(&AssetRef::with_default_tag("hg38", PRIMARY_ASSET))
            .unwrap();
        fs::set_permissions(&fasta, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users bypass mode bits.
        if fs::File::open(&fasta).is_ok() {
            return;
        }

        let err = getseq(&registry, "hg38", "chr1").unwrap_err();
        fs::set_permissions(&fasta, fs::Permissions::from_mode(0o644)).unwrap();
        assert!(matches!(err, RefgenError::Permission { .. }), "{err}");
    }
}
