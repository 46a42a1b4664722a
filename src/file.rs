//! File handles: byte, text, and structured I/O plus copy/move.
//!
//! Whole-file writes stage the bytes in a temp file inside the destination
//! directory and commit it with an atomic rename (replacing) or a no-clobber
//! persist, so readers never observe a half-written file.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::codec::{Codec, KeyedArchiveCodec, Value, XmlPlistCodec};
use crate::config::{self, Durability};
use crate::directory::Directory;
use crate::errors::{FsError, Result};
use crate::fs_ops::helpers::map_io_error;
use crate::fs_ops::{self, atomic, io_copy, io_error_with_help, metadata, space, util};
use crate::path::{Destination, Item, ItemKind, PathCore, stat_kind};
use crate::sentinel::{lenient, succeeded};

/// Handle to a (possibly not yet existing) file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct File {
    core: PathCore,
}

/// Text encodings understood by `File::read_string_with_encoding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Latin1,
    Ascii,
}

impl File {
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

    /// Handle for a `file://` URL.
    pub fn from_url(url: &str) -> Result<Self> {
        Ok(Self {
            core: PathCore::from_url(url)?,
        })
    }

    /// File called `name` in the same directory.
    pub fn sibling(&self, name: &str) -> Result<File> {
        self.parent().file(name)
    }

    // --- create ---

    pub fn create(&self) -> Option<File> {
        self.create_with(false)
    }

    pub fn create_with(&self, overwrite: bool) -> Option<File> {
        lenient("create file", &self.absolute_path(), self.try_create(overwrite))
    }

    /// Create an empty file. Without `overwrite` an existing item fails with
    /// AlreadyExists; with it an existing file is truncated.
    pub fn try_create(&self, overwrite: bool) -> Result<File> {
        let abs = self.absolute_path();
        reject_directory(&abs)?;
        let mut opts = OpenOptions::new();
        opts.write(true);
        if overwrite {
            opts.create(true).truncate(true);
        } else {
            opts.create_new(true);
        }
        let f = opts.open(&abs).map_err(io_error_with_help("create file", &abs))?;
        if config::current().durability == Durability::Full {
            f.sync_all().map_err(io_error_with_help("sync file", &abs))?;
        }
        info!(path = %abs.display(), "created file");
        Ok(self.clone())
    }

    // --- bytes ---

    pub fn read_data(&self) -> Result<Vec<u8>> {
        let abs = self.absolute_path();
        stat_kind::<Self>(&abs)?;
        fs::read(&abs).map_err(io_error_with_help("read", &abs))
    }

    pub fn write_data(&self, data: &[u8]) -> bool {
        self.write_data_with(data, false)
    }

    pub fn write_data_with(&self, data: &[u8], overwrite: bool) -> bool {
        succeeded("write", &self.absolute_path(), self.try_write_data(data, overwrite))
    }

    /// Atomically write `data` as the file's entire content.
    pub fn try_write_data(&self, data: &[u8], overwrite: bool) -> Result<()> {
        let abs = self.absolute_path();
        let mut tmp = self.stage(&abs, overwrite)?;
        io_copy::write_into(tmp.as_file_mut(), data, config::current().durability)
            .map_err(io_error_with_help("write temporary file", tmp.path()))?;
        atomic::commit_temp(tmp, &abs, overwrite)?;
        debug!(path = %abs.display(), bytes = data.len(), overwrite, "wrote file");
        Ok(())
    }

    /// Open a buffered stream writing to the file, creating it if needed.
    /// With `append` writes go to the end; otherwise the file is truncated.
    pub fn output_stream_to_append(&self, append: bool) -> Result<OutputStream> {
        let abs = self.absolute_path();
        reject_directory(&abs)?;
        let mut opts = OpenOptions::new();
        opts.create(true);
        if append {
            opts.append(true);
        } else {
            opts.write(true).truncate(true);
        }
        let f = opts.open(&abs).map_err(io_error_with_help("open for writing", &abs))?;
        Ok(OutputStream {
            path: abs,
            writer: Some(BufWriter::new(f)),
            durability: config::current().durability,
        })
    }

    // --- text ---

    /// Read the file as UTF-8 text.
    pub fn read_string(&self) -> Result<String> {
        self.read_string_with_encoding(Encoding::Utf8)
    }

    pub fn read_string_with_encoding(&self, encoding: Encoding) -> Result<String> {
        let bytes = self.read_data()?;
        decode_text(&bytes, encoding).map_err(|reason| FsError::serialization(self.absolute_path(), reason))
    }

    pub fn write_string(&self, text: &str) -> bool {
        self.write_string_with(text, false)
    }

    pub fn write_string_with(&self, text: &str, overwrite: bool) -> bool {
        succeeded("write", &self.absolute_path(), self.try_write_string(text, overwrite))
    }

    /// Write `text` as UTF-8.
    pub fn try_write_string(&self, text: &str, overwrite: bool) -> Result<()> {
        self.try_write_data(text.as_bytes(), overwrite)
    }

    // --- structured values ---

    /// Encode `value` with `codec` and write it atomically.
    pub fn try_write_encoded(&self, codec: &impl Codec, value: &Value, overwrite: bool) -> Result<()> {
        let bytes = codec
            .encode(value)
            .map_err(|e| FsError::serialization(self.absolute_path(), e))?;
        self.try_write_data(&bytes, overwrite)
    }

    /// Read the file and decode it with `codec`.
    pub fn read_decoded(&self, codec: &impl Codec) -> Result<Value> {
        let bytes = self.read_data()?;
        codec
            .decode(&bytes)
            .map_err(|e| FsError::serialization(self.absolute_path(), e))
    }

    /// Read an XML property list whose root is an array.
    pub fn read_array(&self) -> Result<Vec<Value>> {
        match self.read_decoded(&XmlPlistCodec)? {
            Value::Array(items) => Ok(items),
            other => Err(FsError::serialization(
                self.absolute_path(),
                format!("expected an array at the root, found {}", other.type_name()),
            )),
        }
    }

    pub fn write_array(&self, items: &[Value]) -> bool {
        self.write_array_with(items, false)
    }

    pub fn write_array_with(&self, items: &[Value], overwrite: bool) -> bool {
        succeeded("write array", &self.absolute_path(), self.try_write_array(items, overwrite))
    }

    /// Write `items` as an XML property list.
    pub fn try_write_array(&self, items: &[Value], overwrite: bool) -> Result<()> {
        self.try_write_encoded(&XmlPlistCodec, &Value::Array(items.to_vec()), overwrite)
    }

    /// Read an XML property list whose root is a dictionary.
    pub fn read_dictionary(&self) -> Result<BTreeMap<String, Value>> {
        match self.read_decoded(&XmlPlistCodec)? {
            Value::Dictionary(map) => Ok(map),
            other => Err(FsError::serialization(
                self.absolute_path(),
                format!("expected a dictionary at the root, found {}", other.type_name()),
            )),
        }
    }

    pub fn write_dictionary(&self, map: &BTreeMap<String, Value>) -> bool {
        self.write_dictionary_with(map, false)
    }

    pub fn write_dictionary_with(&self, map: &BTreeMap<String, Value>, overwrite: bool) -> bool {
        succeeded("write dictionary", &self.absolute_path(), self.try_write_dictionary(map, overwrite))
    }

    pub fn try_write_dictionary(&self, map: &BTreeMap<String, Value>, overwrite: bool) -> Result<()> {
        self.try_write_encoded(&XmlPlistCodec, &Value::Dictionary(map.clone()), overwrite)
    }

    pub fn archive(&self, value: &Value) -> bool {
        self.archive_with(value, false)
    }

    pub fn archive_with(&self, value: &Value, overwrite: bool) -> bool {
        succeeded("archive", &self.absolute_path(), self.try_archive(value, overwrite))
    }

    /// Write `value` as a keyed archive.
    pub fn try_archive(&self, value: &Value, overwrite: bool) -> Result<()> {
        self.try_write_encoded(&KeyedArchiveCodec, value, overwrite)
    }

    pub fn unarchive(&self) -> Result<Value> {
        self.read_decoded(&KeyedArchiveCodec)
    }

    pub fn archive_as_xml_plist(&self, value: &Value) -> bool {
        self.archive_as_xml_plist_with(value, false)
    }

    pub fn archive_as_xml_plist_with(&self, value: &Value, overwrite: bool) -> bool {
        succeeded(
            "archive",
            &self.absolute_path(),
            self.try_archive_as_xml_plist(value, overwrite),
        )
    }

    /// Write `value` (any shape) as an XML property list.
    pub fn try_archive_as_xml_plist(&self, value: &Value, overwrite: bool) -> Result<()> {
        self.try_write_encoded(&XmlPlistCodec, value, overwrite)
    }

    pub fn unarchive_from_xml_plist(&self) -> Result<Value> {
        self.read_decoded(&XmlPlistCodec)
    }

    /// Temp file in the directory of `dest`, after the overwrite pre-checks.
    fn stage(&self, dest: &Path, overwrite: bool) -> Result<NamedTempFile> {
        reject_directory(dest)?;
        if !overwrite {
            atomic::ensure_vacant(dest)?;
        }
        let dir = parent_dir(dest)?;
        tempfile::Builder::new()
            .prefix(util::TEMP_PREFIX)
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(io_error_with_help("create temporary file", &dir))
    }
}

impl Item for File {
    const KIND: ItemKind = ItemKind::File;

    fn core(&self) -> &PathCore {
        &self.core
    }

    fn from_core(core: PathCore) -> Self {
        Self { core }
    }

    /// Copy the file's content (and, when configured, timestamps/permissions) to `dest`
    /// through a staged temp file. A copy onto the file's own path is a no-op with
    /// `overwrite` and AlreadyExists without it.
    fn try_copy_to(&self, dest: impl Into<Destination>, overwrite: bool) -> Result<File> {
        let src = self.absolute_path();
        let src_meta = stat_kind::<Self>(&src)?;
        let target = dest.into().target_for(&self.name());
        if target == src {
            if overwrite {
                return Ok(self.clone());
            }
            return Err(FsError::already_exists(&target));
        }

        let cfg = config::current();
        let mut tmp = self.stage(&target, overwrite)?;
        let copied = io_copy::copy_into(&src, tmp.as_file_mut(), cfg.durability)
            .map_err(io_error_with_help("copy", &src))?;
        if cfg.preserve_metadata {
            metadata::preserve_metadata(tmp.path(), &src_meta);
            metadata::preserve_xattrs(&src, tmp.path());
        }
        atomic::commit_temp(tmp, &target, overwrite)?;

        info!(
            src = %src.display(),
            dest = %target.display(),
            size = %space::format_bytes(copied.bytes),
            durability = ?copied.mode,
            "copied file"
        );
        File::from_path(&target)
    }

    /// Rename the file to `dest`; across filesystems copy then delete the source.
    fn try_move_to(&self, dest: impl Into<Destination>, overwrite: bool) -> Result<File> {
        let src = self.absolute_path();
        stat_kind::<Self>(&src)?;
        let target = dest.into().target_for(&self.name());
        if target == src {
            return Ok(self.clone());
        }
        reject_directory(&target)?;
        let dir = parent_dir(&target)?;
        stat_kind::<Directory>(&dir)?;

        let renamed = if overwrite {
            atomic::try_atomic_move(&src, &target)
        } else {
            atomic::rename_no_clobber(&src, &target)
        };
        match renamed {
            Ok(()) => {}
            Err(e) if util::is_cross_device(&e) => {
                debug!(src = %src.display(), dest = %target.display(), "cross-device move; copying instead");
                let copy = self.try_copy_to(File::from_path(&target)?, overwrite)?;
                fs_ops::remove(&src)?;
                info!(src = %src.display(), dest = %target.display(), "moved file");
                return Ok(copy);
            }
            Err(e) => return Err(map_io_error("move", &src, e)),
        }
        info!(src = %src.display(), dest = %target.display(), "moved file");
        File::from_path(&target)
    }
}

/// Fail with TypeMismatch if a directory occupies `path` (symlinks followed).
fn reject_directory(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(m) if m.is_dir() => Err(FsError::type_mismatch(path, ItemKind::File, ItemKind::Directory)),
        _ => Ok(()),
    }
}

fn parent_dir(path: &Path) -> Result<PathBuf> {
    path.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| FsError::invalid_path(path.to_string_lossy(), "path has no parent directory"))
}

fn decode_text(bytes: &[u8], encoding: Encoding) -> std::result::Result<String, String> {
    match encoding {
        Encoding::Utf8 => {
            let body = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(bytes);
            String::from_utf8(body.to_vec()).map_err(|e| format!("invalid UTF-8: {e}"))
        }
        Encoding::Utf16Le | Encoding::Utf16Be => {
            if bytes.len() % 2 != 0 {
                return Err("UTF-16 data has an odd number of bytes".to_string());
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|c| match encoding {
                    Encoding::Utf16Le => u16::from_le_bytes([c[0], c[1]]),
                    _ => u16::from_be_bytes([c[0], c[1]]),
                })
                .collect();
            let units = units.strip_prefix(&[0xFEFF_u16][..]).unwrap_or(units.as_slice());
            String::from_utf16(units).map_err(|e| format!("invalid UTF-16: {e}"))
        }
        Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        Encoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
            Some(at) => Err(format!("non-ASCII byte at offset {at}")),
            None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        },
    }
}

/// Buffered writer over an open file. `close()` flushes (and fsyncs under
/// `Durability::Full`) and reports errors; dropping flushes best-effort.
#[derive(Debug)]
pub struct OutputStream {
    path: PathBuf,
    writer: Option<BufWriter<fs::File>>,
    durability: Durability,
}

impl OutputStream {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn close(mut self) -> Result<()> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        let f = writer
            .into_inner()
            .map_err(|e| map_io_error("flush", &self.path, e.into_error()))?;
        if self.durability == Durability::Full {
            f.sync_all().map_err(io_error_with_help("sync file", &self.path))?;
        }
        Ok(())
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<fs::File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::other("output stream already closed"))
    }
}

impl Write for OutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer()?.flush()
    }
}
