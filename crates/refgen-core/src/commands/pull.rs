//! Download prebuilt assets from the remote catalog.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{RefgenError, Result};
use crate::fs::{ensure_writable, hash_tree};
use crate::recipe::{AssetVars, Catalog};
use crate::registry::{AssetRecord, AssetRef, Registry};
use crate::remote::{RemoteCatalog, archive_path, extract_archive};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullOptions {
    /// Download even if the asset is already registered.
    pub force: bool,
    /// Keep the archive as downloaded and register it instead of the
    /// unpacked folder.
    pub no_untar: bool,
}

#[derive(Debug)]
pub enum PullState {
    /// Downloaded and registered at this absolute path.
    Pulled(PathBuf),
    /// Already registered; nothing downloaded.
    Present(PathBuf),
    Failed(RefgenError),
}

#[derive(Debug)]
pub struct PullOutcome {
    pub target: AssetRef,
    pub state: PullState,
}

/// Pull every target, continuing past per-asset failures.
///
/// The genome folder must exist and be writable before anything is
/// downloaded.
pub fn pull(
    registry: &mut Registry,
    catalog: &Catalog,
    remote: &dyn RemoteCatalog,
    targets: &[AssetRef],
    options: &PullOptions,
) -> Result<Vec<PullOutcome>> {
    let root = registry.genome_folder();
    if !root.is_dir() {
        return Err(RefgenError::MissingFolder { path: root });
    }
    ensure_writable(&root)?;

    let mut outcomes = Vec::with_capacity(targets.len());
    for target in targets {
        let state = match pull_one(registry, catalog, remote, target, options) {
            Ok(state) => state,
            Err(err) => {
                warn!(asset = %target, error = %err, "pull failed");
                let fatal = matches!(err, RefgenError::Persistence { .. });
                outcomes.push(PullOutcome {
                    target: target.clone(),
                    state: PullState::Failed(err),
                });
                if fatal {
                    break;
                }
                continue;
            }
        };
        outcomes.push(PullOutcome {
            target: target.clone(),
            state,
        });
    }
    Ok(outcomes)
}

fn pull_one(
    registry: &mut Registry,
    catalog: &Catalog,
    remote: &dyn RemoteCatalog,
    target: &AssetRef,
    options: &PullOptions,
) -> Result<PullState> {
    if !options.force && let Ok(path) = registry.asset_path(target) {
        debug!(asset = %target, "already registered");
        return Ok(PullState::Present(path));
    }

    let genome_dir = registry.genome_dir(&target.genome);
    let outfolder = genome_dir.join(&target.asset).join(&target.tag);
    let archive = remote.download(target, &archive_path(&outfolder))?;
    if options.no_untar {
        return register_archive(registry, target, &genome_dir, &archive);
    }
    extract_archive(&archive, &outfolder)?;

    let vars = AssetVars::new(&target.genome, &target.asset, &target.tag, &outfolder);
    let fallback = format!("{}/{}", target.asset, target.tag);
    let (path, description) = match catalog.output_for(&target.asset) {
        Some((_, output)) => (
            output
                .path
                .expand(&vars)
                .ok()
                .filter(|p| genome_dir.join(p).exists())
                .unwrap_or(fallback),
            output.description.clone(),
        ),
        None => (fallback, String::new()),
    };

    let digest = hash_tree(&outfolder)
        .map_err(|e| warn!(asset = %target, error = %e, "could not digest pulled asset"))
        .ok();
    registry.upsert_asset(
        target,
        AssetRecord::new(&path, description)
            .with_digest(digest)
            .touched(),
    )?;

    let absolute = genome_dir.join(&path);
    info!(asset = %target, path = %absolute.display(), "pulled");
    Ok(PullState::Pulled(absolute))
}

/// Register the downloaded archive itself.
fn register_archive(
    registry: &mut Registry,
    target: &AssetRef,
    genome_dir: &Path,
    archive: &Path,
) -> Result<PullState> {
    let path = archive
        .strip_prefix(genome_dir)
        .unwrap_or(archive)
        .to_string_lossy()
        .to_string();
    registry.upsert_asset(
        target,
        AssetRecord::new(&path, "unextracted archive").touched(),
    )?;
    info!(asset = %target, archive = %archive.display(), "pulled without extracting");
    Ok(PullState::Pulled(genome_dir.join(&path)))
}
