//! Volume-level size queries for the filesystem a path lives on.

use std::path::Path;

use super::helpers::io_error_with_help;
use crate::errors::Result;

/// Total size in bytes of the volume holding `path`.
pub(crate) fn volume_total_bytes(path: &Path) -> Result<u64> {
    fs2::total_space(path).map_err(io_error_with_help("query volume size", path))
}

/// Bytes available to this process on the volume holding `path`.
pub(crate) fn volume_available_bytes(path: &Path) -> Result<u64> {
    fs2::available_space(path).map_err(io_error_with_help("query volume free space", path))
}

pub(crate) fn format_bytes(n: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let f = n as f64;
    if f >= GB {
        format!("{:.1} GiB", f / GB)
    } else if f >= MB {
        format!("{:.1} MiB", f / MB)
    } else if f >= KB {
        format!("{:.1} KiB", f / KB)
    } else {
        format!("{} B", n)
    }
}
