//! Resolve registered assets to local paths.

use std::path::PathBuf;

use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::registry::{AssetRef, Registry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeekResult {
    pub asset: String,
    pub path: PathBuf,
}

/// Local path of every target, failing on the first unregistered one.
/// Never builds anything.
pub fn seek(registry: &Registry, targets: &[AssetRef]) -> Result<Vec<SeekResult>> {
    targets
        .iter()
        .map(|target| {
            let path = registry.asset_path(target)?;
            if !path.exists() {
                warn!(asset = %target, path = %path.display(), "registered path is missing on disk");
            }
            Ok(SeekResult {
                asset: target.to_string(),
                path,
            })
        })
        .collect()
}
