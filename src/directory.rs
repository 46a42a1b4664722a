//! Directory handles: enumeration, child handles, recursive copy/delete/move.
//!
//! Tree copies are depth-first and fail fast: the first item that cannot be copied
//! aborts the walk and its error is returned. Symlinks inside a tree are recreated
//! as symlinks, never followed. Sockets, FIFOs and devices cannot be copied and fail
//! the walk with TypeMismatch, as does a child whose name is not valid UTF-8
//! (InvalidPath).
//!
//! Copying an item onto its own path fails with AlreadyExists without `overwrite`
//! and is a no-op with it.

use std::ffi::OsStr;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use tracing::{debug, info, trace, warn};

use crate::config;
use crate::errors::{FsError, Result};
use crate::file::File;
use crate::fs_ops::helpers::map_io_error;
use crate::fs_ops::{self, atomic, claim_unique, io_error_with_help, metadata, util};
use crate::path::{Destination, Item, ItemKind, PathCore, numbered_child, placement, stat_kind};
use crate::platform;
use crate::sentinel::{lenient, succeeded};

/// Handle to a (possibly not yet existing) directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Directory {
    core: PathCore,
}

/// A directory child, classified by what its path resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Entry {
    File(File),
    Directory(Directory),
}

impl Entry {
    pub fn name(&self) -> String {
        match self {
            Entry::File(f) => f.name(),
            Entry::Directory(d) => d.name(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Entry::File(f) => f.path(),
            Entry::Directory(d) => d.path(),
        }
    }

    pub fn as_file(&self) -> Option<&File> {
        match self {
            Entry::File(f) => Some(f),
            Entry::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<&Directory> {
        match self {
            Entry::Directory(d) => Some(d),
            Entry::File(_) => None,
        }
    }
}

impl Directory {
    pub fn new(path: impl Into<String>) -> Result<Self> {
        Ok(Self {
            core: PathCore::new(path)?,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self {
            core: PathCore::from_path(path)?,
        })
    }

    pub fn from_url(url: &str) -> Result<Self> {
        Ok(Self {
            core: PathCore::from_url(url)?,
        })
    }

    // --- inspection ---

    pub fn is_empty(&self) -> Result<bool> {
        let abs = self.absolute_path();
        stat_kind::<Self>(&abs)?;
        Ok(fs_ops::list(&abs)?.is_empty())
    }

    /// Direct children sorted by name. Symlinks are classified by their target;
    /// a dangling link counts as a file. A child whose name is not valid UTF-8
    /// fails the listing with InvalidPath.
    pub fn items(&self) -> Result<Vec<Entry>> {
        let abs = self.absolute_path();
        stat_kind::<Self>(&abs)?;
        let mut out = Vec::new();
        for name in fs_ops::list(&abs)? {
            let child = self.core.join(utf8_name(&abs, &name)?)?;
            let is_dir = match fs::metadata(abs.join(&name)) {
                Ok(m) => m.is_dir(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    if fs::symlink_metadata(abs.join(&name)).is_err() {
                        trace!(name = ?name, "entry vanished during listing");
                        continue;
                    }
                    false
                }
                Err(e) => return Err(map_io_error("stat", &abs.join(&name), e)),
            };
            out.push(if is_dir {
                Entry::Directory(Directory::from_core(child))
            } else {
                Entry::File(File::from_core(child))
            });
        }
        Ok(out)
    }

    pub fn files(&self) -> Result<Vec<File>> {
        Ok(self
            .items()?
            .into_iter()
            .filter_map(|e| match e {
                Entry::File(f) => Some(f),
                Entry::Directory(_) => None,
            })
            .collect())
    }

    pub fn subdirectories(&self) -> Result<Vec<Directory>> {
        Ok(self
            .items()?
            .into_iter()
            .filter_map(|e| match e {
                Entry::Directory(d) => Some(d),
                Entry::File(_) => None,
            })
            .collect())
    }

    /// Files whose extension equals `ext` (case-insensitive, leading dot optional).
    pub fn files_with_extension(&self, ext: &str) -> Result<Vec<File>> {
        let wanted = ext.trim_start_matches('.');
        Ok(self
            .files()?
            .into_iter()
            .filter(|f| f.extension().eq_ignore_ascii_case(wanted))
            .collect())
    }

    // --- child handles ---

    pub fn subdirectory(&self, name: &str) -> Result<Directory> {
        Ok(Directory::from_core(self.core.join(name)?))
    }

    pub fn file(&self, name: &str) -> Result<File> {
        Ok(File::from_core(self.core.join(name)?))
    }

    /// File called `name.ext` (an empty `ext` gives just `name`).
    pub fn file_with_name(&self, name: &str, ext: &str) -> Result<File> {
        let ext = ext.trim_start_matches('.');
        if ext.is_empty() {
            self.file(name)
        } else {
            self.file(&format!("{name}.{ext}"))
        }
    }

    /// Handle to `name`, or "name N.ext" if `name` is taken. Nothing is created.
    pub fn file_with_numeric_suffix_if_exists(&self, name: &str) -> Result<File> {
        numbered_child(&self.core, name)
    }

    /// Handle to `name`, or "name N" if `name` is taken. Nothing is created.
    pub fn subdirectory_with_numeric_suffix_if_exists(&self, name: &str) -> Result<Directory> {
        numbered_child(&self.core, name)
    }

    pub fn create_file_with_numeric_suffix(&self, name: &str) -> Option<File> {
        lenient(
            "create file",
            &self.absolute_path(),
            self.try_create_file_with_numeric_suffix(name),
        )
    }

    /// Create an empty file named `name` (or the first free "name N.ext") in one
    /// race-free step.
    pub fn try_create_file_with_numeric_suffix(&self, name: &str) -> Result<File> {
        let abs = self.absolute_path();
        stat_kind::<Self>(&abs)?;
        let (chosen, _) = claim_unique(name, placement(ItemKind::File), |candidate| {
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(abs.join(candidate))
        })
        .map_err(io_error_with_help("create file", &abs))?;
        info!(dir = %abs.display(), name = %chosen, "created file");
        self.file(&chosen)
    }

    pub fn create_subdirectory_with_numeric_suffix(&self, name: &str) -> Option<Directory> {
        lenient(
            "create directory",
            &self.absolute_path(),
            self.try_create_subdirectory_with_numeric_suffix(name),
        )
    }

    /// Create the subdirectory `name` (or the first free "name N") in one race-free step.
    pub fn try_create_subdirectory_with_numeric_suffix(&self, name: &str) -> Result<Directory> {
        let abs = self.absolute_path();
        stat_kind::<Self>(&abs)?;
        let (chosen, _) = claim_unique(name, placement(ItemKind::Directory), |candidate| {
            fs::create_dir(abs.join(candidate))
        })
        .map_err(io_error_with_help("create directory", &abs))?;
        info!(dir = %abs.display(), name = %chosen, "created directory");
        self.subdirectory(&chosen)
    }

    // --- mutation ---

    pub fn create(&self) -> Option<Directory> {
        lenient("create directory", &self.absolute_path(), self.try_create())
    }

    /// Create the directory and any missing parents; a no-op if it already exists.
    pub fn try_create(&self) -> Result<Directory> {
        let abs = self.absolute_path();
        if let Ok(m) = fs::metadata(&abs) {
            if m.is_dir() {
                return Ok(self.clone());
            }
            return Err(FsError::type_mismatch(&abs, ItemKind::Directory, ItemKind::of(&m)));
        }
        fs::create_dir_all(&abs).map_err(io_error_with_help("create directory", &abs))?;
        debug!(path = %abs.display(), "created directory");
        Ok(self.clone())
    }

    pub fn delete_contents(&self) -> bool {
        succeeded("delete contents", &self.absolute_path(), self.try_delete_contents())
    }

    /// Remove every child, leaving the directory itself in place. Children that
    /// disappear concurrently are ignored.
    pub fn try_delete_contents(&self) -> Result<()> {
        let abs = self.absolute_path();
        stat_kind::<Self>(&abs)?;
        let mut removed = 0usize;
        for name in fs_ops::list(&abs)? {
            match fs_ops::remove(&abs.join(&name)) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == crate::errors::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        info!(path = %abs.display(), removed, "deleted directory contents");
        Ok(())
    }

    pub fn copy_contents_to(&self, dest: &Directory) -> Option<Directory> {
        self.copy_contents_to_with(dest, false)
    }

    pub fn copy_contents_to_with(&self, dest: &Directory, overwrite: bool) -> Option<Directory> {
        lenient(
            "copy contents",
            &self.absolute_path(),
            self.try_copy_contents_to(dest, overwrite),
        )
    }

    /// Copy every child into `dest` (created if missing). Items copied before a
    /// failure stay in place.
    pub fn try_copy_contents_to(&self, dest: &Directory, overwrite: bool) -> Result<Directory> {
        let src = self.absolute_path();
        stat_kind::<Self>(&src)?;
        let dst = dest.absolute_path();
        reject_nesting(&src, &dst)?;
        dest.try_create()?;
        copy_children(&src, dest, overwrite)?;
        info!(src = %src.display(), dest = %dst.display(), "copied directory contents");
        Ok(dest.clone())
    }
}

impl Item for Directory {
    const KIND: ItemKind = ItemKind::Directory;

    fn core(&self) -> &PathCore {
        &self.core
    }

    fn from_core(core: PathCore) -> Self {
        Self { core }
    }

    /// Copy the tree into `dest`. With `overwrite` the copy is staged in a hidden
    /// sibling and swapped in only once complete, so a failure leaves the old
    /// destination untouched.
    fn try_copy_to(&self, dest: impl Into<Destination>, overwrite: bool) -> Result<Directory> {
        let src = self.absolute_path();
        stat_kind::<Self>(&src)?;
        let target = directory_target(dest.into(), &self.name())?;
        if target == src {
            if overwrite {
                return Ok(self.clone());
            }
            return Err(FsError::already_exists(&target));
        }
        reject_nesting(&src, &target)?;
        let parent = target
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| FsError::invalid_path(target.to_string_lossy(), "path has no parent directory"))?;
        stat_kind::<Self>(&parent)?;

        if !overwrite {
            copy_fresh(&src, &target)?;
        } else {
            let staged = util::unique_temp_path(&parent);
            copy_fresh(&src, &staged)?;
            let swapped = atomic::clear_then_rename(&staged, &target);
            if let Err(e) = swapped {
                if let Err(cleanup) = fs_ops::remove(&staged) {
                    warn!(path = %staged.display(), error = %cleanup, "failed to remove staged copy");
                }
                return Err(e);
            }
        }
        info!(src = %src.display(), dest = %target.display(), overwrite, "copied directory");
        Directory::from_path(&target)
    }

    /// Rename the tree into `dest`; across filesystems copy then delete the source.
    fn try_move_to(&self, dest: impl Into<Destination>, overwrite: bool) -> Result<Directory> {
        let src = self.absolute_path();
        stat_kind::<Self>(&src)?;
        let target = directory_target(dest.into(), &self.name())?;
        if target == src {
            return Ok(self.clone());
        }
        reject_nesting(&src, &target)?;

        if fs::symlink_metadata(&target).is_ok() {
            if !overwrite {
                return Err(FsError::already_exists(&target));
            }
            fs_ops::remove(&target)?;
        }

        match atomic::rename_no_clobber(&src, &target) {
            Ok(()) => {}
            Err(e) if util::is_cross_device(&e) => {
                debug!(src = %src.display(), dest = %target.display(), "cross-device move; copying instead");
                copy_fresh(&src, &target)?;
                fs_ops::remove(&src)?;
            }
            Err(e) => return Err(map_io_error("move", &src, e)),
        }
        info!(src = %src.display(), dest = %target.display(), "moved directory");
        Directory::from_path(&target)
    }
}

/// Resolve the target of a directory copy/move; a file destination is a type error.
fn directory_target(dest: Destination, name: &str) -> Result<std::path::PathBuf> {
    match dest {
        Destination::Into(dir) => Ok(dir.absolute_path().join(name)),
        Destination::Exactly(file) => Err(FsError::type_mismatch(
            file.absolute_path(),
            ItemKind::Directory,
            ItemKind::File,
        )),
    }
}

/// Copying a tree into itself would never terminate.
fn reject_nesting(src: &Path, target: &Path) -> Result<()> {
    if target.starts_with(src) {
        return Err(FsError::invalid_path(
            target.to_string_lossy(),
            format!("cannot copy or move '{}' into itself", src.display()),
        ));
    }
    Ok(())
}

/// `name` as UTF-8, or InvalidPath: such a child cannot be addressed by a handle.
fn utf8_name<'a>(dir: &Path, name: &'a OsStr) -> Result<&'a str> {
    name.to_str().ok_or_else(|| {
        FsError::invalid_path(
            dir.join(name).to_string_lossy(),
            "name is not valid UTF-8",
        )
    })
}

/// Copy the tree at `src` to `target`, which must not exist yet. A partial
/// copy is removed on failure.
fn copy_fresh(src: &Path, target: &Path) -> Result<()> {
    fs::create_dir(target).map_err(io_error_with_help("create directory", target))?;
    let res = Directory::from_path(target).and_then(|t| copy_children(src, &t, false));
    if let Err(e) = res {
        if let Err(cleanup) = fs_ops::remove(target) {
            warn!(path = %target.display(), error = %cleanup, "failed to remove partial copy");
        }
        return Err(e);
    }
    if config::current().preserve_metadata {
        if let Ok(meta) = fs::metadata(src) {
            metadata::preserve_metadata(target, &meta);
        }
    }
    Ok(())
}

/// Depth-first copy of `src`'s children into `dest`, routing each through the
/// matching handle's `try_copy_to`.
fn copy_children(src: &Path, dest: &Directory, overwrite: bool) -> Result<()> {
    for name in fs_ops::list(src)? {
        let from = src.join(&name);
        let meta = match fs::symlink_metadata(&from) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(map_io_error("stat", &from, e)),
        };
        if meta.file_type().is_symlink() {
            copy_symlink(&from, &dest.absolute_path().join(&name), overwrite)?;
            continue;
        }
        utf8_name(src, &name)?;
        match ItemKind::of(&meta) {
            ItemKind::Directory => {
                Directory::from_path(&from)?.try_copy_to(dest, overwrite)?;
            }
            ItemKind::File => {
                File::from_path(&from)?.try_copy_to(dest, overwrite)?;
            }
            ItemKind::Other => {
                return Err(FsError::type_mismatch(&from, ItemKind::File, ItemKind::Other));
            }
        }
    }
    Ok(())
}

fn copy_symlink(from: &Path, to: &Path, overwrite: bool) -> Result<()> {
    let target = fs::read_link(from).map_err(io_error_with_help("read symlink", from))?;
    if overwrite {
        crate::path::clear_for_overwrite(to)?;
    }
    platform::symlink(&target, to, from.is_dir()).map_err(io_error_with_help("create symlink", to))?;
    trace!(link = %to.display(), target = %target.display(), "recreated symlink");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use tempfile::tempdir;

    fn dir_at(p: &Path) -> Directory {
        Directory::from_path(p).unwrap()
    }

    #[test]
    fn items_are_sorted_and_classified() {
        let td = tempdir().unwrap();
        fs::write(td.path().join("b.txt"), "b").unwrap();
        fs::create_dir(td.path().join("a")).unwrap();
        fs::write(td.path().join("C.TXT"), "c").unwrap();
        let d = dir_at(td.path());

        let names: Vec<_> = d.items().unwrap().iter().map(Entry::name).collect();
        assert_eq!(names, vec!["C.TXT", "a", "b.txt"]);
        assert_eq!(d.subdirectories().unwrap().len(), 1);
        assert_eq!(d.files().unwrap().len(), 2);
        assert_eq!(d.files_with_extension(".txt").unwrap().len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_links_are_files() {
        let td = tempdir().unwrap();
        std::os::unix::fs::symlink(td.path().join("missing"), td.path().join("dangling")).unwrap();
        let items = dir_at(td.path()).items().unwrap();
        assert!(matches!(items.as_slice(), [Entry::File(_)]));
    }

    #[test]
    fn create_rejects_a_file_in_the_way() {
        let td = tempdir().unwrap();
        fs::write(td.path().join("x"), "").unwrap();
        let err = dir_at(&td.path().join("x")).try_create().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        let nested = dir_at(&td.path().join("p").join("q"));
        nested.try_create().unwrap();
        nested.try_create().unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn copy_into_own_subtree_is_rejected() {
        let td = tempdir().unwrap();
        let src = dir_at(&td.path().join("src"));
        src.try_create().unwrap();
        let inner = src.subdirectory("inner").unwrap().try_create().unwrap();
        let err = src.try_copy_to(&inner, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPath);
        assert_eq!(src.try_move_to(&inner, true).unwrap_err().kind(), ErrorKind::InvalidPath);
    }

    #[test]
    fn file_destination_is_a_type_mismatch() {
        let td = tempdir().unwrap();
        let src = dir_at(&td.path().join("src"));
        src.try_create().unwrap();
        let f = File::from_path(&td.path().join("f")).unwrap();
        assert_eq!(src.try_copy_to(&f, false).unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn numbered_claims_do_not_collide() {
        let td = tempdir().unwrap();
        let d = dir_at(td.path());
        let a = d.try_create_file_with_numeric_suffix("notes.md").unwrap();
        let b = d.try_create_file_with_numeric_suffix("notes.md").unwrap();
        assert_eq!(a.name(), "notes.md");
        assert_eq!(b.name(), "notes 2.md");
        let s = d.try_create_subdirectory_with_numeric_suffix("Photos").unwrap();
        let t = d.try_create_subdirectory_with_numeric_suffix("Photos").unwrap();
        assert_eq!((s.name().as_str(), t.name().as_str()), ("Photos", "Photos 2"));
    }

    #[test]
    fn file_with_name_joins_extension() {
        let d = Directory::new("/tmp").unwrap();
        assert_eq!(d.file_with_name("a", ".txt").unwrap().name(), "a.txt");
        assert_eq!(d.file_with_name("a", "").unwrap().name(), "a");
    }
}
