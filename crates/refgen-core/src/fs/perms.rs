//! Permission checks made before touching the filesystem.
//!
//! Checked before creating output folders or deleting assets so a denied
//! operation aborts with the offending path instead of a half-finished
//! write.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Access, RefgenError, Result};

/// Confirm that `path`, or the closest ancestor that exists, accepts new
/// entries.
pub fn ensure_writable(path: &Path) -> Result<()> {
    let dir = existing_ancestor(path)?;
    let scratch = dir.join(format!(".refgen-write-check-{}", std::process::id()));
    match OpenOptions::new().write(true).create_new(true).open(&scratch) {
        Ok(_) => {
            let _ = fs::remove_file(&scratch);
            debug!(path = %dir.display(), "write access confirmed");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => Err(RefgenError::Permission {
            path: dir,
            access: Access::Write,
        }),
        Err(e) => Err(RefgenError::io(dir, e)),
    }
}

/// Confirm that an existing file or folder can be read (and, for folders,
/// traversed).
pub fn ensure_readable(path: &Path) -> Result<()> {
    let denied = |access| RefgenError::Permission {
        path: path.to_path_buf(),
        access,
    };
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => RefgenError::MissingPath {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => denied(Access::Execute),
        _ => RefgenError::io(path, e),
    })?;

    let result = if metadata.is_dir() {
        fs::read_dir(path).map(|_| ())
    } else {
        fs::File::open(path).map(|_| ())
    };
    result.map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => denied(Access::Read),
        _ => RefgenError::io(path, e),
    })
}

fn existing_ancestor(path: &Path) -> Result<PathBuf> {
    let mut current = Some(path);
    while let Some(candidate) = current {
        if candidate.is_dir() {
            return Ok(candidate.to_path_buf());
        }
        current = candidate.parent().map(|p| {
            if p.as_os_str().is_empty() {
                Path::new(".")
            } else {
                p
            }
        });
    }
    Err(RefgenError::MissingFolder {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writable_walks_up_to_existing_folder() {
        let temp = TempDir::new().unwrap();
        let deep = temp.path().join("hg38").join("fasta").join("default");
        ensure_writable(&deep).unwrap();
        assert!(!deep.exists(), "the check must not create the target");
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn readable_reports_missing_path() {
        let temp = TempDir::new().unwrap();
        let err = ensure_readable(&temp.path().join("absent.fa")).unwrap_err();
        assert!(matches!(err, RefgenError::MissingPath { .. }));
        ensure_readable(temp.path()).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn read_only_folder_is_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let locked = temp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        // Privileged users bypass mode bits.
        if fs::write(locked.join("canary"), "").is_ok() {
            return;
        }

        let err = ensure_writable(&locked.join("child")).unwrap_err();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        match err {
            RefgenError::Permission { path, access } => {
                assert_eq!(path, locked);
                assert_eq!(access, Access::Write);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_is_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let file = temp.path().join("hg38.fa");
        fs::write(&file, ">chr1\nACGT\n").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users bypass mode bits.
        if fs::File::open(&file).is_ok() {
            return;
        }

        let err = ensure_readable(&file).unwrap_err();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o644)).unwrap();
        match err {
            RefgenError::Permission { path, access } => {
                assert_eq!(path, file);
                assert_eq!(access, Access::Read);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
