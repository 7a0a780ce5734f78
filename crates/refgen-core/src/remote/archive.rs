//! Asset archive extraction.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{RefgenError, Result};

/// Unpack the zip at `archive` into `dest`, returning the number of files
/// written. Entries whose names escape `dest` are skipped.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(archive).map_err(|e| RefgenError::io(archive, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| {
        RefgenError::Remote(format!("{} is not a zip archive: {}", archive.display(), e))
    })?;
    fs::create_dir_all(dest).map_err(|e| RefgenError::io(dest, e))?;

    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| {
            RefgenError::Remote(format!("bad entry {} in {}: {}", i, archive.display(), e))
        })?;
        let Some(relative) = entry.enclosed_name() else {
            warn!(entry = entry.name(), "skipping archive entry outside destination");
            continue;
        };
        let outpath = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&outpath).map_err(|e| RefgenError::io(&outpath, e))?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent).map_err(|e| RefgenError::io(parent, e))?;
        }
        let mut out = File::create(&outpath).map_err(|e| RefgenError::io(&outpath, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| RefgenError::io(&outpath, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode)).ok();
            }
        }
        written += 1;
    }

    debug!(archive = %archive.display(), dest = %dest.display(), files = written, "extracted archive");
    Ok(written)
}
