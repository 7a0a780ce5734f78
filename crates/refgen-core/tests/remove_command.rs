//! Removal planning and execution against a temporary genome folder.

mod support;

use std::path::PathBuf;

use refgen_core::commands::{RemoveRequest, execute_remove, plan_remove};
use refgen_core::registry::{AssetRecord, AssetRef, Registry};
use refgen_core::remote::archive_path;
use tempfile::TempDir;

use support::{config_bytes, registry, write_file};

/// Register `target` at `relative` and put a file there.
fn install(registry: &mut Registry, target: &AssetRef, relative: &str) -> PathBuf {
    let path = write_file(&registry.genome_dir(&target.genome).join(relative), "data\n");
    registry
        .upsert_asset(target, AssetRecord::new(relative, "test asset"))
        .unwrap();
    path
}

#[test]
fn unknown_target_is_a_no_op() {
    let temp = TempDir::new().unwrap();
    let mut registry = registry(&temp);
    let gtf = AssetRef::with_default_tag("hg38", "gencode_gtf");
    let file = install(&mut registry, &gtf, "gencode_gtf/default/hg38.gtf.gz");
    let before = config_bytes(&registry);

    let plan = plan_remove(
        &registry,
        &RemoveRequest::Assets(vec![gtf.clone(), AssetRef::with_default_tag("hg38", "nope")]),
    );
    assert!(plan.is_noop());
    assert_eq!(plan.missing, vec!["hg38/nope:default".to_string()]);

    let report = execute_remove(&mut registry, &plan);
    assert!(report.removed.is_empty());
    assert!(file.exists());
    assert_eq!(config_bytes(&registry), before);
}

#[test]
fn unknown_genome_is_a_no_op() {
    let temp = TempDir::new().unwrap();
    let registry = registry(&temp);
    let plan = plan_remove(&registry, &RemoveRequest::Genome("mm10".to_string()));
    assert!(plan.is_noop());
    assert_eq!(plan.missing, vec!["mm10".to_string()]);
}

#[test]
fn removes_several_assets_with_their_folders() {
    let temp = TempDir::new().unwrap();
    let mut registry = registry(&temp);
    let gtf = AssetRef::with_default_tag("hg38", "gencode_gtf");
    let refgene = AssetRef::with_default_tag("hg38", "refgene_anno");
    install(&mut registry, &gtf, "gencode_gtf/default/hg38.gtf.gz");
    install(&mut registry, &refgene, "refgene_anno/default/hg38_refGene.txt.gz");

    let plan = plan_remove(&registry, &RemoveRequest::Assets(vec![gtf.clone(), refgene.clone()]));
    assert_eq!(plan.items.len(), 2);
    let report = execute_remove(&mut registry, &plan);

    assert!(report.is_success());
    assert_eq!(report.removed, vec![gtf.clone(), refgene.clone()]);
    let genome_dir = registry.genome_dir("hg38");
    assert!(!genome_dir.join("gencode_gtf/default").exists());
    assert!(!genome_dir.join("refgene_anno/default").exists());
    assert!(!registry.has_asset(&gtf));
    assert!(!registry.has_asset(&refgene));

    // the change is on disk, not only in memory
    registry.reload().unwrap();
    assert!(!registry.has_asset(&gtf));
}

#[test]
fn shared_folder_survives_partial_removal() {
    let temp = TempDir::new().unwrap();
    let mut registry = registry(&temp);
    let fasta = AssetRef::with_default_tag("hg38", "fasta");
    let sizes = AssetRef::with_default_tag("hg38", "chrom_sizes");
    let fa = install(&mut registry, &fasta, "fasta/default/hg38.fa");
    let chrom = install(&mut registry, &sizes, "fasta/default/hg38.chrom.sizes");

    let plan = plan_remove(&registry, &RemoveRequest::Assets(vec![sizes.clone()]));
    let report = execute_remove(&mut registry, &plan);

    assert!(report.is_success());
    assert_eq!(report.warnings.len(), 1);
    assert!(fa.exists());
    assert!(chrom.exists());
    assert!(registry.has_asset(&fasta));
    assert!(!registry.has_asset(&sizes));
}

#[test]
fn removing_a_genome_clears_every_asset() {
    let temp = TempDir::new().unwrap();
    let mut registry = registry(&temp);
    install(&mut registry, &AssetRef::with_default_tag("hg38", "fasta"), "fasta/default/hg38.fa");
    install(
        &mut registry,
        &AssetRef::with_default_tag("hg38", "chrom_sizes"),
        "fasta/default/hg38.chrom.sizes",
    );
    install(
        &mut registry,
        &AssetRef::new("hg38", "gencode_gtf", "v32"),
        "gencode_gtf/v32/hg38.gtf.gz",
    );
    let other = AssetRef::with_default_tag("mm10", "fasta");
    install(&mut registry, &other, "fasta/default/mm10.fa");

    let plan = plan_remove(&registry, &RemoveRequest::Genome("hg38".to_string()));
    assert_eq!(plan.items.len(), 3);
    let report = execute_remove(&mut registry, &plan);

    assert!(report.is_success());
    assert_eq!(report.removed.len(), 3);
    assert!(report.warnings.is_empty());
    assert!(registry.genome("hg38").unwrap().asset_tags().is_empty());
    assert!(!registry.genome_dir("hg38").join("fasta/default").exists());
    assert!(registry.has_asset(&other));
    assert!(registry.asset_path(&other).unwrap().exists());
}

#[test]
fn files_outside_the_genome_folder_are_kept() {
    let temp = TempDir::new().unwrap();
    let mut registry = registry(&temp);
    let outside = write_file(&temp.path().join("outside/annotation.bed"), "chr1\t0\t10\n");
    let target = AssetRef::with_default_tag("hg38", "custom");
    registry
        .upsert_asset(
            &target,
            AssetRecord::new(outside.display().to_string(), "external file"),
        )
        .unwrap();

    let plan = plan_remove(&registry, &RemoveRequest::Assets(vec![target.clone()]));
    let report = execute_remove(&mut registry, &plan);

    assert!(report.is_success());
    assert_eq!(report.warnings.len(), 1);
    assert!(outside.exists());
    assert!(!registry.has_asset(&target));
}

#[test]
fn archive_next_to_the_asset_is_deleted() {
    let temp = TempDir::new().unwrap();
    let mut registry = registry(&temp);
    let target = AssetRef::with_default_tag("hg38", "gencode_gtf");
    install(&mut registry, &target, "gencode_gtf/default/hg38.gtf.gz");
    let asset_dir = registry.genome_dir("hg38").join("gencode_gtf/default");
    let archive = write_file(&archive_path(&asset_dir), "PK");

    let plan = plan_remove(&registry, &RemoveRequest::Assets(vec![target]));
    assert_eq!(plan.items[0].archive, archive);
    let report = execute_remove(&mut registry, &plan);

    assert!(report.is_success());
    assert!(!archive.exists());
    assert!(!asset_dir.exists());
}

#[test]
fn folder_of_a_vanished_file_is_still_removed() {
    let temp = TempDir::new().unwrap();
    let mut registry = registry(&temp);
    let target = AssetRef::with_default_tag("hg38", "fasta");
    let file = install(&mut registry, &target, "fasta/default/hg38.fa");
    write_file(&file.with_file_name("hg38.fa.fai"), "index\n");
    std::fs::remove_file(&file).unwrap();
    let asset_dir = registry.genome_dir("hg38").join("fasta/default");

    let plan = plan_remove(&registry, &RemoveRequest::Assets(vec![target.clone()]));
    assert_eq!(plan.items[0].asset_dir, asset_dir);
    let report = execute_remove(&mut registry, &plan);

    assert!(report.is_success());
    assert!(!asset_dir.exists());
    assert!(registry.asset_record(&target).is_err());
}

#[test]
fn registered_archive_is_removed_with_its_record() {
    let temp = TempDir::new().unwrap();
    let mut registry = registry(&temp);
    let target = AssetRef::with_default_tag("hg38", "gencode_gtf");
    let archive = install(&mut registry, &target, "gencode_gtf/default.zip");
    let other = AssetRef::new("hg38", "gencode_gtf", "v2");
    let kept = install(&mut registry, &other, "gencode_gtf/v2/hg38.gtf.gz");

    let plan = plan_remove(&registry, &RemoveRequest::Assets(vec![target]));
    assert_eq!(plan.items[0].archive, archive);
    let report = execute_remove(&mut registry, &plan);

    assert!(report.is_success());
    assert!(!archive.exists());
    assert!(kept.exists());
}
