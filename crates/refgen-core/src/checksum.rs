//! Content-addressable genome identity.
//!
//! # Algorithm
//! - Stream records in file order
//! - Normalize each sequence: drop whitespace, uppercase ASCII
//! - Contig digest: first 24 bytes of SHA-512 over the normalized bytes,
//!   lowercase hex (48 chars)
//! - Collection digest: the same truncated SHA-512 over the concatenated
//!   contig digests' hex text, in file order
//!
//! Changing any of these steps changes every recorded genome identity.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha512};
use tracing::debug;

use crate::error::{RefgenError, Result};
use crate::fasta::{FastaLine, SequenceReader};

/// Bytes of the SHA-512 output kept in a digest.
const DIGEST_BYTES: usize = 24;

/// Contig name to digest, in the order the contigs appear in the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentChecksumTable {
    entries: Vec<(String, String)>,
}

impl ContentChecksumTable {
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write `name<TAB>digest` lines.
    pub fn write_tsv(&self, path: &Path) -> Result<()> {
        let mut out = Vec::new();
        for (name, digest) in &self.entries {
            writeln!(out, "{}\t{}", name, digest).map_err(|e| RefgenError::io(path, e))?;
        }
        fs::write(path, out).map_err(|e| RefgenError::persistence(path, e))?;
        debug!(path = %path.display(), contigs = self.entries.len(), "wrote content checksums");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomeChecksum {
    pub collection: String,
    pub contents: ContentChecksumTable,
}

/// Compute contig and collection digests for every record of `reader`.
///
/// Sequence lines are hashed as they are read; no contig is held in memory.
pub fn compute_genome_checksum(reader: &dyn SequenceReader) -> Result<GenomeChecksum> {
    let mut entries = Vec::new();
    let mut current: Option<(String, Sha512)> = None;
    reader.visit_lines(&mut |line: FastaLine| -> Result<()> {
        match line {
            FastaLine::Header(name) => {
                if let Some((done, hasher)) = current.replace((name, Sha512::new())) {
                    entries.push((done, truncated_hex(hasher)));
                }
            }
            FastaLine::Bases(bases) => {
                if let Some((_, hasher)) = current.as_mut() {
                    update_normalized(hasher, &bases);
                }
            }
        }
        Ok(())
    })?;
    if let Some((done, hasher)) = current {
        entries.push((done, truncated_hex(hasher)));
    }

    let mut collection = Sha512::new();
    for (_, digest) in &entries {
        collection.update(digest.as_bytes());
    }
    let collection = truncated_hex(collection);
    debug!(
        origin = %reader.origin().display(),
        contigs = entries.len(),
        collection = %collection,
        "computed genome checksum"
    );

    Ok(GenomeChecksum {
        collection,
        contents: ContentChecksumTable { entries },
    })
}

/// Digest of one sequence after normalization.
pub fn sequence_digest(sequence: &str) -> String {
    let mut hasher = Sha512::new();
    update_normalized(&mut hasher, sequence);
    truncated_hex(hasher)
}

/// Hash `text` with whitespace dropped and bases upper-cased.
fn update_normalized(hasher: &mut Sha512, text: &str) {
    let normalized: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .map(|b| b.to_ascii_uppercase())
        .collect();
    hasher.update(&normalized);
}

fn truncated_hex(hasher: Sha512) -> String {
    hasher.finalize()[..DIGEST_BYTES]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Where the content table of `genome` lives inside its primary asset folder.
pub fn content_table_path(asset_outfolder: &Path, genome: &str) -> PathBuf {
    asset_outfolder.join(format!("{}_content_checksums.tsv", genome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fasta::FastaReader;
    use tempfile::TempDir;

    fn checksum_of(text: &str) -> GenomeChecksum {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("genome.fa");
        fs::write(&path, text).unwrap();
        compute_genome_checksum(&FastaReader::open(&path).unwrap()).unwrap()
    }

    #[test]
    fn digest_is_48_hex_chars() {
        let digest = sequence_digest("ACGT");
        assert_eq!(digest.len(), DIGEST_BYTES * 2);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn case_and_wrapping_do_not_matter() {
        let a = checksum_of(">chr1\nACGTACGT\n>chr2\nTTGG\n");
        let b = checksum_of(">chr1\nacgt\nACgt\n>chr2\nt\nt\ng\ng\n");
        assert_eq!(a, b);
    }

    #[test]
    fn identical_input_is_deterministic() {
        let text = ">chr1\nACGT\n>chr2\nGGCC\n";
        assert_eq!(checksum_of(text), checksum_of(text));
    }

    #[test]
    fn order_is_part_of_identity() {
        let a = checksum_of(">chr1\nACGT\n>chr2\nGGCC\n");
        let b = checksum_of(">chr2\nGGCC\n>chr1\nACGT\n");
        assert_ne!(a.collection, b.collection);
        assert_eq!(a.contents.get("chr1"), b.contents.get("chr1"));
    }

    #[test]
    fn content_change_changes_collection() {
        let a = checksum_of(">chr1\nACGT\n");
        let b = checksum_of(">chr1\nACGA\n");
        assert_ne!(a.collection, b.collection);
    }

    #[test]
    fn streamed_digest_matches_whole_sequence() {
        let sums = checksum_of(">chr1\nAC\nGT\nac\n>empty\n");
        assert_eq!(sums.contents.get("chr1"), Some(sequence_digest("ACGTAC").as_str()));
        assert_eq!(sums.contents.get("empty"), Some(sequence_digest("").as_str()));
    }

    #[test]
    fn collection_is_digest_of_concatenated_hex() {
        let sums = checksum_of(">chr1\nACGT\n>chr2\nGG\n");
        let joined = format!("{}{}", sequence_digest("ACGT"), sequence_digest("GG"));
        let mut hasher = Sha512::new();
        hasher.update(joined.as_bytes());
        assert_eq!(sums.collection, truncated_hex(hasher));
    }

    #[test]
    fn table_preserves_file_order() {
        let sums = checksum_of(">z\nA\n>a\nC\n>m\nG\n");
        let names: Vec<_> = sums.contents.entries().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn tsv_lines_match_entries() {
        let temp = TempDir::new().unwrap();
        let sums = checksum_of(">chr1\nACGT\n>chr2\nacgt\n");
        let path = content_table_path(temp.path(), "hg38");
        sums.contents.write_tsv(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("chr1\t"));
        assert_eq!(sums.contents.get("chr1"), sums.contents.get("chr2"));
    }
}
