//! Streaming copy with configurable durability.
//!
//! Features:
//! - Writes into an already-open destination (normally a staged temp file), never a live path.
//! - Buffered I/O with large (1 MiB) buffers to reduce syscall count.
//! - Optional full fsync for strong durability guarantees.
//!
//! Snapshot semantics: the source file is read once from start to EOF; if it grows
//! concurrently, the additional bytes are not included.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use crate::config::Durability;

const BUF_SIZE: usize = 1024 * 1024; // 1 MiB buffers

/// Result of a streaming copy operation.
#[derive(Debug, Clone, Copy)]
pub struct CopyResult {
    /// Total bytes copied from source to destination.
    pub bytes: u64,
    /// Durability mode applied.
    pub mode: Durability,
}

/// Copy the contents of `src` into `dst_f`, then flush or fsync per `mode`.
pub(crate) fn copy_into(src: &Path, dst_f: &mut File, mode: Durability) -> io::Result<CopyResult> {
    let src_f = File::open(src)?;

    // Linux: try copy_file_range for an in-kernel copy when supported.
    #[cfg(target_os = "linux")]
    {
        use std::os::unix::io::AsRawFd;
        let mut total: u64 = 0;
        let chunk: usize = 16 * 1024 * 1024;
        loop {
            let rc = unsafe {
                libc::copy_file_range(
                    src_f.as_raw_fd(),
                    std::ptr::null_mut(),
                    dst_f.as_raw_fd(),
                    std::ptr::null_mut(),
                    chunk,
                    0,
                )
            };
            if rc > 0 {
                total += rc as u64;
                continue;
            } else if rc == 0 {
                finish(dst_f, mode)?;
                return Ok(CopyResult { bytes: total, mode });
            } else {
                let err = io::Error::last_os_error();
                let unsupported = matches!(
                    err.raw_os_error(),
                    Some(code) if code == libc::EXDEV
                        || code == libc::ENOSYS
                        || code == libc::EINVAL
                        || code == libc::EPERM
                        || code == libc::EOPNOTSUPP
                );
                // Partial copy then error: the caller discards the staged file.
                if total == 0 && unsupported {
                    break;
                }
                return Err(err);
            }
        }
    }

    let mut reader = BufReader::with_capacity(BUF_SIZE, src_f);
    let mut writer = BufWriter::with_capacity(BUF_SIZE, &mut *dst_f);
    let bytes = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    drop(writer);

    finish(dst_f, mode)?;
    Ok(CopyResult { bytes, mode })
}

/// Write `data` into `dst_f`, then flush or fsync per `mode`.
pub(crate) fn write_into(dst_f: &mut File, data: &[u8], mode: Durability) -> io::Result<()> {
    dst_f.write_all(data)?;
    finish(dst_f, mode)
}

fn finish(dst_f: &mut File, mode: Durability) -> io::Result<()> {
    dst_f.flush()?;
    if matches!(mode, Durability::Full) {
        dst_f.sync_all()?;
    }
    Ok(())
}
