//! Remove assets from disk and from the registry.
//!
//! Removal runs in two phases. [`plan_remove`] resolves every target and
//! touches nothing; if any target is unknown the whole request is a no-op.
//! [`execute_remove`] then deletes item by item, continuing past failures.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{RefgenError, Result};
use crate::fs::ensure_writable;
use crate::registry::{AssetRef, Registry};
use crate::remote::archive_path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveRequest {
    Assets(Vec<AssetRef>),
    /// Every asset registered for the genome.
    Genome(String),
}

/// One resolved removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveItem {
    pub target: AssetRef,
    /// Absolute registered path.
    pub path: PathBuf,
    /// Folder deleted with the asset.
    pub asset_dir: PathBuf,
    pub archive: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovePlan {
    pub items: Vec<RemoveItem>,
    /// Targets that are not registered, as `genome/asset:tag` or genome name.
    pub missing: Vec<String>,
}

impl RemovePlan {
    /// Nothing will be removed: either a target is missing or there is
    /// nothing registered.
    pub fn is_noop(&self) -> bool {
        !self.missing.is_empty() || self.items.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct RemoveReport {
    pub removed: Vec<AssetRef>,
    pub failures: Vec<(AssetRef, RefgenError)>,
    pub warnings: Vec<String>,
}

impl RemoveReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Resolve every target of `request` without touching the filesystem.
pub fn plan_remove(registry: &Registry, request: &RemoveRequest) -> RemovePlan {
    let targets = match request {
        RemoveRequest::Assets(targets) => targets.clone(),
        RemoveRequest::Genome(genome) => match registry.genome(genome) {
            Ok(record) => record
                .asset_tags()
                .into_iter()
                .map(|(asset, tag)| AssetRef::new(genome, asset, tag))
                .collect(),
            Err(_) => {
                return RemovePlan {
                    items: Vec::new(),
                    missing: vec![genome.clone()],
                };
            }
        },
    };

    let mut plan = RemovePlan::default();
    for target in targets {
        match registry.asset_path(&target) {
            Ok(path) => {
                let (asset_dir, archive) = asset_files(&path);
                plan.items.push(RemoveItem {
                    target,
                    path,
                    asset_dir,
                    archive,
                });
            }
            Err(_) => plan.missing.push(target.to_string()),
        }
    }
    if !plan.missing.is_empty() {
        plan.items.clear();
    }
    plan
}

/// Delete and deregister every item of `plan`.
///
/// An asset folder is only deleted when it lies inside the genome folder
/// and holds no record that survives this removal; otherwise the record is
/// dropped and the files are left in place.
pub fn execute_remove(registry: &mut Registry, plan: &RemovePlan) -> RemoveReport {
    let mut report = RemoveReport::default();
    if plan.is_noop() {
        return report;
    }

    let removing: BTreeSet<&AssetRef> = plan.items.iter().map(|i| &i.target).collect();
    let genome_folder = registry.genome_folder();

    for item in &plan.items {
        let survivors = surviving_paths(registry, &item.target.genome, &removing);
        match remove_item(registry, item, &genome_folder, &survivors) {
            Ok(warning) => {
                if let Some(warning) = warning {
                    warn!(asset = %item.target, "{}", warning);
                    report.warnings.push(warning);
                }
                info!(asset = %item.target, "removed");
                report.removed.push(item.target.clone());
            }
            Err(err) => {
                warn!(asset = %item.target, error = %err, "failed to remove");
                report.failures.push((item.target.clone(), err));
            }
        }
    }
    report
}

/// Folder and archive that belong to a registered path.
///
/// A registered folder is its own asset folder. A registered archive
/// stands for the folder it would unpack into. Anything else, including a
/// path that no longer exists, belongs to its parent folder.
fn asset_files(path: &Path) -> (PathBuf, PathBuf) {
    if path.extension().is_some_and(|ext| ext == "zip") {
        return (path.with_extension(""), path.to_path_buf());
    }
    let asset_dir = match path.parent() {
        Some(parent) if !path.is_dir() => parent.to_path_buf(),
        _ => path.to_path_buf(),
    };
    let archive = archive_path(&asset_dir);
    (asset_dir, archive)
}

fn surviving_paths(registry: &Registry, genome: &str, removing: &BTreeSet<&AssetRef>) -> Vec<PathBuf> {
    let Ok(record) = registry.genome(genome) else {
        return Vec::new();
    };
    record
        .asset_tags()
        .into_iter()
        .map(|(asset, tag)| AssetRef::new(genome, asset, tag))
        .filter(|r| !removing.contains(r))
        .filter_map(|r| registry.asset_path(&r).ok())
        .collect()
}

fn remove_item(
    registry: &mut Registry,
    item: &RemoveItem,
    genome_folder: &Path,
    survivors: &[PathBuf],
) -> Result<Option<String>> {
    let genome_dir = genome_folder.join(&item.target.genome);
    let shared = survivors.iter().any(|p| p.starts_with(&item.asset_dir));
    let owned = item.asset_dir.starts_with(&genome_dir) && item.asset_dir != genome_dir;

    let mut warning = None;
    if item.archive.is_file() {
        delete(&item.archive)?;
    }
    if !owned {
        warning = Some(format!(
            "{} is outside the genome folder, leaving files in place",
            item.asset_dir.display()
        ));
    } else if shared {
        warning = Some(format!(
            "{} holds other registered assets, leaving files in place",
            item.asset_dir.display()
        ));
    } else if item.asset_dir.exists() {
        delete(&item.asset_dir)?;
    }

    registry.remove_asset(&item.target)?;
    Ok(warning)
}

fn delete(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_writable(parent)?;
    }
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(RefgenError::io(path, e)),
    }
}
