//! Built-in build packages.

use crate::error::Result;

use super::{BuildPackage, package};

/// Asset whose build establishes a genome's content identity.
pub const PRIMARY_ASSET: &str = "fasta";

/// Recipe inputs the command line accepts as `--<name>`.
pub const RECIPE_INPUTS: &[&str] = &["fasta", "gtf", "gff", "context", "refgene"];

/// Recipe inputs that name files read by the build.
pub const FILE_INPUTS: &[&str] = &["fasta", "gtf", "gff", "refgene"];

const IMAGE: &str = "databio/refgenie";

pub(super) fn packages() -> Result<Vec<BuildPackage>> {
    Ok(vec![
        package(
            PRIMARY_ASSET,
            "DNA sequences in the FASTA format, indexed, with chromosome sizes",
            &["fasta"],
            &[],
            &[
                "cp {fasta} {asset_outfolder}/{genome}.fa",
                "samtools faidx {asset_outfolder}/{genome}.fa",
                "cut -f 1,2 {asset_outfolder}/{genome}.fa.fai > {asset_outfolder}/{genome}.chrom.sizes",
            ],
            &[
                (
                    "fasta",
                    "{asset}/{tag}/{genome}.fa",
                    "DNA sequences in the FASTA format",
                ),
                (
                    "chrom_sizes",
                    "{asset}/{tag}/{genome}.chrom.sizes",
                    "Sizes of the chromosomes",
                ),
            ],
            Some(IMAGE),
        )?,
        package(
            "bowtie2_index",
            "Genome index for bowtie2",
            &[],
            &["fasta"],
            &["bowtie2-build {assets.fasta} {asset_outfolder}/{genome}"],
            &[("bowtie2_index", "{asset}/{tag}", "Genome index for bowtie2")],
            Some(IMAGE),
        )?,
        package(
            "bwa_index",
            "Genome index for the Burrows-Wheeler Alignment Tool",
            &[],
            &["fasta"],
            &[
                "cp {assets.fasta} {asset_outfolder}/{genome}.fa",
                "bwa index {asset_outfolder}/{genome}.fa",
            ],
            &[("bwa_index", "{asset}/{tag}", "Genome index for bwa")],
            Some(IMAGE),
        )?,
        package(
            "hisat2_index",
            "Genome index for HISAT2",
            &[],
            &["fasta"],
            &["hisat2-build {assets.fasta} {asset_outfolder}/{genome}"],
            &[("hisat2_index", "{asset}/{tag}", "Genome index for HISAT2")],
            Some(IMAGE),
        )?,
        package(
            "bismark_bt2_index",
            "Genome index for Bisulfite-Seq applications, produced by bowtie2",
            &[],
            &["fasta"],
            &[
                "cp {assets.fasta} {asset_outfolder}/{genome}.fa",
                "bismark_genome_preparation --bowtie2 {asset_outfolder}",
            ],
            &[(
                "bismark_bt2_index",
                "{asset}/{tag}",
                "Genome index for bismark, produced with bowtie2",
            )],
            Some(IMAGE),
        )?,
        package(
            "epilog_index",
            "Genome index for CpG sites, produced by the epilog DNA methylation caller",
            &["context"],
            &["fasta"],
            &["epilog index -- --infile {assets.fasta} --outfile {asset_outfolder}/{genome}_{context}.tsv --contexts {context}"],
            &[(
                "epilog_index",
                "{asset}/{tag}/{genome}_{context}.tsv",
                "Genome index for epilog",
            )],
            Some(IMAGE),
        )?,
        package(
            "gencode_gtf",
            "GTF annotation asset which provides access to all annotated transcripts",
            &["gtf"],
            &[],
            &["cp {gtf} {asset_outfolder}/{genome}.gtf.gz"],
            &[(
                "gencode_gtf",
                "{asset}/{tag}/{genome}.gtf.gz",
                "GTF annotation of all annotated transcripts",
            )],
            None,
        )?,
        package(
            "ensembl_rb",
            "A regulatory annotation file",
            &["gff"],
            &[],
            &["cp {gff} {asset_outfolder}/{genome}.gff.gz"],
            &[(
                "ensembl_rb",
                "{asset}/{tag}/{genome}.gff.gz",
                "Ensembl regulatory build annotation",
            )],
            None,
        )?,
        package(
            "refgene_anno",
            "Gene, TSS, exon, intron, and premature mRNA annotation files",
            &["refgene"],
            &[],
            &["cp {refgene} {asset_outfolder}/{genome}_refGene.txt.gz"],
            &[(
                "refgene_anno",
                "{asset}/{tag}/{genome}_refGene.txt.gz",
                "RefGene annotation",
            )],
            None,
        )?,
    ])
}
