//! Atomic rename and commit helpers.
//! - Replacing rename with context-rich errors (Windows: removes an existing file first).
//! - No-clobber rename (Linux: renameat2(RENAME_NOREPLACE); elsewhere a checked rename).
//! - Commit of a staged temp file, replacing or no-clobber.
//! - On Unix, best-effort fsync of the destination directory after the rename.

use std::fs;
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;

use super::helpers::map_io_error;
use super::util;
use crate::errors::{FsError, Result};

/// Rename `src` over `dst`, replacing a file already at `dst`.
pub(crate) fn try_atomic_move(src: &Path, dst: &Path) -> io::Result<()> {
    // Windows: ensure destination path is free (rename doesn't overwrite there).
    #[cfg(windows)]
    {
        if dst.is_file() {
            if let Err(e) = fs::remove_file(dst) {
                if e.kind() != io::ErrorKind::NotFound {
                    return Err(e);
                }
            }
        }
    }

    fs::rename(src, dst)?;
    sync_parent(dst);
    Ok(())
}

/// Rename `src` to `dst`, failing with AlreadyExists if anything is at `dst`.
pub(crate) fn rename_no_clobber(src: &Path, dst: &Path) -> io::Result<()> {
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;
        let to_c = |p: &Path| {
            CString::new(p.as_os_str().as_bytes())
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL"))
        };
        let (src_c, dst_c) = (to_c(src)?, to_c(dst)?);
        let rc = unsafe {
            libc::renameat2(
                libc::AT_FDCWD,
                src_c.as_ptr(),
                libc::AT_FDCWD,
                dst_c.as_ptr(),
                libc::RENAME_NOREPLACE,
            )
        };
        if rc == 0 {
            sync_parent(dst);
            return Ok(());
        }
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            // Filesystem or kernel without RENAME_NOREPLACE: use the checked rename below.
            Some(code) if code == libc::EINVAL || code == libc::ENOSYS => {
                tracing::trace!(src = %src.display(), dst = %dst.display(), "renameat2 unsupported; using checked rename");
            }
            _ => return Err(err),
        }
    }

    if fs::symlink_metadata(dst).is_ok() {
        return Err(io::Error::from(io::ErrorKind::AlreadyExists));
    }
    fs::rename(src, dst)?;
    sync_parent(dst);
    Ok(())
}

/// Commit a fully written temp file to `dest`.
/// With `overwrite` an existing file is atomically replaced; without it an existing
/// item makes the commit fail with AlreadyExists and the temp file is discarded.
pub(crate) fn commit_temp(tmp: NamedTempFile, dest: &Path, overwrite: bool) -> Result<()> {
    let persisted = if overwrite {
        tmp.persist(dest)
    } else {
        tmp.persist_noclobber(dest)
    };
    // On failure the PersistError still owns the temp file; dropping it removes it.
    persisted.map_err(|e| map_io_error("commit temporary file", dest, io::Error::from(e)))?;
    sync_parent(dest);
    Ok(())
}

/// Fail with AlreadyExists when anything (including a dangling symlink) is at `dest`.
pub(crate) fn ensure_vacant(dest: &Path) -> Result<()> {
    if fs::symlink_metadata(dest).is_ok() {
        return Err(FsError::already_exists(dest));
    }
    Ok(())
}

/// Replace whatever is at `dst` with the fully prepared `staged` item.
/// `dst` is removed first; `staged` stays in place if the rename fails.
pub(crate) fn clear_then_rename(staged: &Path, dst: &Path) -> Result<()> {
    match fs::symlink_metadata(dst) {
        Ok(_) => super::remove(dst)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(map_io_error("stat", dst, e)),
    }
    fs::rename(staged, dst).map_err(|e| map_io_error("rename staged copy", dst, e))?;
    sync_parent(dst);
    Ok(())
}

fn sync_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        // Ignore fsync errors to avoid turning a successful rename into a failure.
        let _ = util::fsync_dir(parent);
    }
}
