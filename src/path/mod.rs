//! Path handles.
//!
//! `Item` is the behavior shared by `File` and `Directory`: path accessors,
//! live existence/metadata queries, navigation, links, and the copy/move verbs.
//! Each handle composes a `PathCore` and fixes its kind at the type level.
//!
//! Mutating verbs come in three forms:
//! - `verb(..)`: overwrite = false; failures are logged and turned into `None`/`false`.
//! - `verb_with(.., overwrite)`: same, with an explicit overwrite flag.
//! - `try_verb(.., overwrite)`: returns `Result<_, FsError>`; the other two wrap it.

mod base;
mod metadata;
mod url;

pub use self::base::PathCore;
pub use self::metadata::Metadata;

use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::codec::Value;
use crate::directory::Directory;
use crate::errors::{FsError, Result};
use crate::file::File;
use crate::fs_ops::{self, SuffixPlacement, helpers::map_io_error, io_error_with_help, resolve_name, space};
use crate::sentinel::{lenient, succeeded};

/// What an on-disk item (or a handle) is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    File,
    Directory,
    /// Sockets, FIFOs, devices, dangling links.
    Other,
}

impl ItemKind {
    pub(crate) fn of(meta: &fs::Metadata) -> Self {
        let ft = meta.file_type();
        if ft.is_dir() {
            ItemKind::Directory
        } else if ft.is_file() {
            ItemKind::File
        } else {
            ItemKind::Other
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItemKind::File => "file",
            ItemKind::Directory => "directory",
            ItemKind::Other => "other",
        })
    }
}

/// Split a file name on its last dot. A leading dot alone does not start an
/// extension, and a trailing dot yields no extension.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        None | Some(0) => (name, None),
        Some(i) if i + 1 == name.len() => (name, None),
        Some(i) => (&name[..i], Some(&name[i + 1..])),
    }
}

pub(crate) fn name_of(path: &Path) -> String {
    match path.file_name() {
        Some(n) => n.to_string_lossy().into_owned(),
        None => path.to_string_lossy().into_owned(),
    }
}

/// Where a copy or move lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Into this directory, keeping the source's name.
    Into(Directory),
    /// Exactly this path (file sources only).
    Exactly(File),
}

impl Destination {
    /// Absolute target path for a source called `name`.
    pub(crate) fn target_for(&self, name: &str) -> PathBuf {
        match self {
            Destination::Into(dir) => dir.absolute_path().join(name),
            Destination::Exactly(file) => file.absolute_path(),
        }
    }
}

impl From<Directory> for Destination {
    fn from(d: Directory) -> Self {
        Destination::Into(d)
    }
}

impl From<&Directory> for Destination {
    fn from(d: &Directory) -> Self {
        Destination::Into(d.clone())
    }
}

impl From<File> for Destination {
    fn from(f: File) -> Self {
        Destination::Exactly(f)
    }
}

impl From<&File> for Destination {
    fn from(f: &File) -> Self {
        Destination::Exactly(f.clone())
    }
}

/// Suffix placement used for numbered children of kind `kind`.
pub(crate) fn placement(kind: ItemKind) -> SuffixPlacement {
    match kind {
        ItemKind::File => SuffixPlacement::BeforeExtension,
        _ => SuffixPlacement::End,
    }
}

/// Behavior shared by file and directory handles.
pub trait Item: Sized + Clone {
    /// The kind this handle type stands for.
    const KIND: ItemKind;

    fn core(&self) -> &PathCore;
    fn from_core(core: PathCore) -> Self;

    /// Copy to `dest`. Returns a handle to the copy.
    fn try_copy_to(&self, dest: impl Into<Destination>, overwrite: bool) -> Result<Self>;

    /// Move to `dest`. Returns a handle at the new location.
    fn try_move_to(&self, dest: impl Into<Destination>, overwrite: bool) -> Result<Self>;

    // --- paths ---

    /// The construction string, verbatim.
    fn path(&self) -> &str {
        self.core().as_str()
    }

    fn absolute_path(&self) -> PathBuf {
        self.core().absolute_path()
    }

    fn path_components(&self) -> Vec<String> {
        self.core().components()
    }

    fn absolute_path_components(&self) -> Vec<String> {
        self.core().absolute_components()
    }

    fn file_url(&self) -> String {
        self.core().file_url()
    }

    fn name(&self) -> String {
        self.core().name()
    }

    fn name_without_extension(&self) -> String {
        self.core().name_without_extension()
    }

    fn extension(&self) -> String {
        self.core().extension()
    }

    // --- existence ---

    /// True if an item of this handle's kind exists at the path (symlinks followed).
    fn exists(&self) -> bool {
        fs::metadata(self.absolute_path())
            .map(|m| ItemKind::of(&m) == Self::KIND)
            .unwrap_or(false)
    }

    /// True if anything, of any kind, is at the path (including a dangling symlink).
    fn item_exists(&self) -> bool {
        fs::symlink_metadata(self.absolute_path()).is_ok()
    }

    fn is_directory(&self) -> bool {
        self.absolute_path().is_dir()
    }

    fn is_file(&self) -> bool {
        self.absolute_path().is_file()
    }

    fn is_symlink(&self) -> bool {
        fs::symlink_metadata(self.absolute_path())
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    // --- metadata ---

    fn metadata(&self) -> Result<Metadata> {
        let abs = self.absolute_path();
        let meta = fs_ops::stat(&abs)?;
        Ok(Metadata::read(&abs, &meta))
    }

    fn attributes(&self) -> Result<BTreeMap<String, Value>> {
        Ok(self.metadata()?.to_attributes())
    }

    /// Size in bytes; for directories the recursive sum of contained file sizes.
    fn size(&self) -> Result<u64> {
        let abs = self.absolute_path();
        let meta = stat_kind::<Self>(&abs)?;
        if Self::KIND != ItemKind::Directory {
            return Ok(meta.len());
        }
        let mut total: u64 = 0;
        for entry in WalkDir::new(&abs).min_depth(1) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) if e.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound) => continue,
                Err(e) => {
                    let at = e.path().unwrap_or(&abs).to_path_buf();
                    return Err(map_io_error("walk directory", &at, io::Error::other(e)));
                }
            };
            if entry.file_type().is_file() {
                match entry.metadata() {
                    Ok(m) => total = total.saturating_add(m.len()),
                    Err(e) if e.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound) => {}
                    Err(e) => return Err(map_io_error("stat", entry.path(), io::Error::other(e))),
                }
            }
        }
        Ok(total)
    }

    fn creation_date(&self) -> Result<DateTime<Local>> {
        let abs = self.absolute_path();
        let meta = fs_ops::stat(&abs)?;
        meta.created()
            .map(DateTime::<Local>::from)
            .map_err(io_error_with_help("read creation date", &abs))
    }

    fn modification_date(&self) -> Result<DateTime<Local>> {
        let abs = self.absolute_path();
        let meta = fs_ops::stat(&abs)?;
        meta.modified()
            .map(DateTime::<Local>::from)
            .map_err(io_error_with_help("read modification date", &abs))
    }

    /// Total size of the volume holding this item.
    fn file_system_size(&self) -> Result<u64> {
        space::volume_total_bytes(&self.absolute_path())
    }

    /// Space available to this process on the volume holding this item.
    fn file_system_free_size(&self) -> Result<u64> {
        space::volume_available_bytes(&self.absolute_path())
    }

    // --- navigation ---

    fn parent(&self) -> Directory {
        Directory::from_core(self.core().parent())
    }

    /// `name` appended to this path, as the same kind of handle.
    fn subitem(&self, name: &str) -> Result<Self> {
        Ok(Self::from_core(self.core().join(name)?))
    }

    /// Like `subitem`, but if something already exists under `name` the first free
    /// "name N" (N = 2, 3, ...) is used instead. Nothing is created.
    fn subitem_with_numeric_suffix_if_exists(&self, name: &str) -> Result<Self> {
        numbered_child(self.core(), name)
    }

    /// Handle to the fully resolved target of this path (all symlinks followed).
    fn resolving_symlinks(&self) -> Result<Self> {
        let abs = self.absolute_path();
        let resolved = dunce::canonicalize(&abs).map_err(io_error_with_help("resolve symlinks", &abs))?;
        Ok(Self::from_core(PathCore::from_path(&resolved)?))
    }

    // --- delete ---

    fn delete(&self) -> bool {
        succeeded("delete", &self.absolute_path(), self.try_delete())
    }

    /// Remove the item (recursively for directories). A symlink is removed, not its target.
    fn try_delete(&self) -> Result<()> {
        let abs = self.absolute_path();
        let meta = fs::symlink_metadata(&abs).map_err(io_error_with_help("stat", &abs))?;
        if !meta.file_type().is_symlink() {
            let found = ItemKind::of(&meta);
            if found != Self::KIND {
                return Err(FsError::type_mismatch(&abs, Self::KIND, found));
            }
        }
        fs_ops::remove(&abs)?;
        info!(path = %abs.display(), kind = %Self::KIND, "deleted");
        Ok(())
    }

    // --- copy / move ---

    fn copy_to(&self, dest: impl Into<Destination>) -> Option<Self> {
        self.copy_to_with(dest, false)
    }

    fn copy_to_with(&self, dest: impl Into<Destination>, overwrite: bool) -> Option<Self> {
        lenient("copy", &self.absolute_path(), self.try_copy_to(dest, overwrite))
    }

    fn move_to(&self, dest: impl Into<Destination>) -> Option<Self> {
        self.move_to_with(dest, false)
    }

    fn move_to_with(&self, dest: impl Into<Destination>, overwrite: bool) -> Option<Self> {
        lenient("move", &self.absolute_path(), self.try_move_to(dest, overwrite))
    }

    // --- links ---

    fn create_symlink_at(&self, link: &Self) -> Option<Self> {
        self.create_symlink_at_with(link, false)
    }

    fn create_symlink_at_with(&self, link: &Self, overwrite: bool) -> Option<Self> {
        lenient(
            "create symlink",
            &link.absolute_path(),
            self.try_create_symlink_at(link, overwrite),
        )
    }

    /// Create a symlink at `link` pointing to this item's absolute path.
    fn try_create_symlink_at(&self, link: &Self, overwrite: bool) -> Result<Self> {
        let target = self.absolute_path();
        let link_path = link.absolute_path();
        if !self.item_exists() {
            return Err(FsError::not_found(&target));
        }
        if overwrite {
            clear_for_overwrite(&link_path)?;
        }
        fs_ops::create_symlink(&target, &link_path, Self::KIND == ItemKind::Directory)?;
        debug!(target = %target.display(), link = %link_path.display(), "created symlink");
        Ok(link.clone())
    }

    fn create_hard_link_at(&self, link: &Self) -> Option<Self> {
        self.create_hard_link_at_with(link, false)
    }

    fn create_hard_link_at_with(&self, link: &Self, overwrite: bool) -> Option<Self> {
        lenient(
            "create hard link",
            &link.absolute_path(),
            self.try_create_hard_link_at(link, overwrite),
        )
    }

    /// Create a hard link at `link` to this file. Directories cannot be hard-linked.
    fn try_create_hard_link_at(&self, link: &Self, overwrite: bool) -> Result<Self> {
        let target = self.absolute_path();
        if Self::KIND == ItemKind::Directory {
            return Err(FsError::type_mismatch(&target, ItemKind::File, ItemKind::Directory));
        }
        stat_kind::<Self>(&target)?;
        let link_path = link.absolute_path();
        if overwrite {
            clear_for_overwrite(&link_path)?;
        }
        fs_ops::create_hard_link(&target, &link_path)?;
        debug!(target = %target.display(), link = %link_path.display(), "created hard link");
        Ok(link.clone())
    }
}

/// stat `path` and require the item there to be of `T`'s kind.
pub(crate) fn stat_kind<T: Item>(path: &Path) -> Result<fs::Metadata> {
    let meta = fs_ops::stat(path)?;
    let found = ItemKind::of(&meta);
    if found != T::KIND {
        return Err(FsError::type_mismatch(path, T::KIND, found));
    }
    Ok(meta)
}

/// Child `name` of `container` as a `T`, numbered if the name is taken.
pub(crate) fn numbered_child<T: Item>(container: &PathCore, name: &str) -> Result<T> {
    if name.is_empty() {
        return Err(FsError::invalid_path(name, "child name is empty"));
    }
    let base = container.absolute_path();
    let chosen = resolve_name(name, placement(T::KIND), |candidate| {
        fs::symlink_metadata(base.join(candidate)).is_ok()
    });
    Ok(T::from_core(container.join(&chosen)?))
}

/// Remove whatever occupies `path` so it can be replaced; absence is fine.
pub(crate) fn clear_for_overwrite(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(_) => fs_ops::remove(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(map_io_error("stat", path, e)),
    }
}
