//! Deterministic digest of an asset output folder.
//!
//! Recorded on each asset after a build so a later pull or rebuild can be
//! compared byte-for-byte against what was registered.

use std::fs;
use std::path::Path;

use anyhow::Context;

/// Files never included in the digest: the completion marker is written
/// after the content it certifies.
const IGNORED: &[&str] = &[crate::build::COMPLETION_MARKER];

/// Compute a blake3 digest over every file below `path`.
///
/// # Algorithm
/// - Entries are visited depth-first in byte order of their names
/// - Directory: `relative_path || 0xFF`
/// - File: `relative_path || 0x00 || content`
/// - Output: 64 lowercase hex chars
///
/// Symlinks are rejected rather than followed.
pub fn hash_tree(path: &Path) -> anyhow::Result<String> {
    let mut hasher = blake3::Hasher::new();
    visit(&mut hasher, path, "")?;
    Ok(hasher.finalize().to_hex().to_string())
}

fn visit(hasher: &mut blake3::Hasher, dir: &Path, base: &str) -> anyhow::Result<()> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read directory entries: {}", dir.display()))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if base.is_empty() && IGNORED.contains(&name.as_ref()) {
            continue;
        }
        let rel_path = if base.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", base, name)
        };

        let ty = entry
            .file_type()
            .with_context(|| format!("Failed to stat: {}", entry.path().display()))?;
        if ty.is_dir() {
            hasher.update(rel_path.as_bytes());
            hasher.update(&[0xFF]);
            visit(hasher, &entry.path(), &rel_path)?;
        } else if ty.is_file() {
            hasher.update(rel_path.as_bytes());
            hasher.update(&[0x00]);
            let content = fs::read(entry.path())
                .with_context(|| format!("Failed to read file: {}", entry.path().display()))?;
            hasher.update(&content);
        } else if ty.is_symlink() {
            anyhow::bail!("Symlinks are not supported: {}", entry.path().display());
        } else {
            anyhow::bail!("Unsupported filesystem entry: {}", entry.path().display());
        }
    }
    Ok(())
}
