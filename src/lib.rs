//! Typed file and directory handles.
//!
//! `File` and `Directory` are cheap path values with live queries and
//! collision-aware mutating operations:
//! - copy/move/create/write never clobber unless asked (`overwrite = true`);
//! - whole-file writes are staged and committed atomically;
//! - "numeric suffix" helpers pick "report 2.txt", "report 3.txt", ... when a name is taken;
//! - structured values (`codec::Value`) are read and written through pluggable codecs.
//!
//! ```no_run
//! use fs_handles::prelude::*;
//!
//! # fn main() -> fs_handles::Result<()> {
//! let docs = Directory::new("~/Documents")?.try_create()?;
//! let report = docs.file_with_numeric_suffix_if_exists("report.txt")?;
//! report.try_write_string("quarterly numbers", false)?;
//! let backup = Directory::new("~/Backups")?.try_create()?;
//! report.try_copy_to(&backup, true)?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod directory;
pub mod errors;
pub mod file;
pub mod fs_ops;
pub mod logging;
pub mod path;
pub mod platform;
mod sentinel;
pub mod system_dirs;

pub use directory::{Directory, Entry};
pub use errors::{ErrorKind, FsError, Result};
pub use file::{Encoding, File, OutputStream};
pub use path::{Destination, Item, ItemKind, Metadata, PathCore};

/// Handles, the `Item` trait, and the codec types in one import.
pub mod prelude {
    pub use crate::codec::{Codec, KeyedArchiveCodec, Value, XmlPlistCodec};
    pub use crate::directory::{Directory, Entry};
    pub use crate::errors::{ErrorKind, FsError};
    pub use crate::file::{Encoding, File};
    pub use crate::path::{Destination, Item, ItemKind};
}
