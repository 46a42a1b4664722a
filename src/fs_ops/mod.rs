//! Filesystem access layer consumed by the handles.
//! Thin wrappers over std::fs that speak `FsError`, plus atomic commit, streaming
//! copy, metadata preservation, volume queries and collision-free naming.

pub(crate) mod atomic;
pub mod duplicate;
pub mod helpers;
pub(crate) mod io_copy;
pub(crate) mod metadata;
pub(crate) mod space;
pub(crate) mod util;

pub use duplicate::{SuffixPlacement, claim_unique, resolve_name};
pub use helpers::io_error_with_help;

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

use crate::errors::Result;
use crate::platform;

/// stat(2): metadata of `path`, following symlinks.
pub(crate) fn stat(path: &Path) -> Result<fs::Metadata> {
    fs::metadata(path).map_err(io_error_with_help("stat", path))
}

/// Names of the direct children of `dir`, exactly as stored on disk, skipping
/// entries that vanish mid-listing.
pub(crate) fn list(dir: &Path) -> Result<Vec<OsString>> {
    let rd = fs::read_dir(dir).map_err(io_error_with_help("list directory", dir))?;
    let mut names = Vec::new();
    for entry in rd {
        match entry {
            Ok(e) => names.push(e.file_name()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(helpers::map_io_error("list directory", dir, e)),
        }
    }
    names.sort();
    Ok(names)
}

/// Remove whatever is at `path` without following a final symlink; directories recursively.
pub(crate) fn remove(path: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(path).map_err(io_error_with_help("stat", path))?;
    let res = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        remove_file_or_link(path, &meta)
    };
    res.map_err(io_error_with_help("remove", path))
}

#[cfg(windows)]
fn remove_file_or_link(path: &Path, meta: &fs::Metadata) -> io::Result<()> {
    use std::os::windows::fs::FileTypeExt;
    // Directory symlinks/junctions on Windows must be removed as directories.
    if meta.file_type().is_symlink_dir() {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    }
}

#[cfg(not(windows))]
fn remove_file_or_link(path: &Path, _meta: &fs::Metadata) -> io::Result<()> {
    fs::remove_file(path)
}

/// Create a symbolic link at `link` pointing to `target`.
pub(crate) fn create_symlink(target: &Path, link: &Path, target_is_dir: bool) -> Result<()> {
    platform::symlink(target, link, target_is_dir).map_err(io_error_with_help("create symlink", link))
}

/// Create a hard link at `link` to the file at `target`.
pub(crate) fn create_hard_link(target: &Path, link: &Path) -> Result<()> {
    fs::hard_link(target, link).map_err(io_error_with_help("create hard link", link))
}
