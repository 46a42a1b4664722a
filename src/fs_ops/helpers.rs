//! I/O error helpers.
//!
//! Converts io::Error into the crate's typed `FsError`, keeping the original error
//! as the source and enriching the message with op/path plus platform-aware hints.
//!
//! Usage:
//!   fs::create_dir_all(dir).map_err(io_error_with_help("create dir", dir))?;

use std::io;
use std::path::Path;

use crate::errors::FsError;

/// Format a human-friendly message with op/path plus platform-aware hints.
fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);

    if let Some(code) = e.raw_os_error() {
        #[cfg(unix)]
        {
            match code {
                libc::EACCES | libc::EPERM => {
                    msg.push_str(": permission denied; check ownership and write permissions.");
                }
                libc::EXDEV => {
                    msg.push_str(": cross-filesystem; atomic rename not possible.");
                }
                libc::EBUSY => {
                    msg.push_str(": resource busy; ensure no other process is writing.");
                }
                libc::ENOENT => {
                    msg.push_str(": path not found; verify it exists.");
                }
                libc::EEXIST => {
                    msg.push_str(": already exists; pick a unique name or remove the target.");
                }
                libc::ENOTEMPTY => {
                    msg.push_str(": directory not empty.");
                }
                libc::ENOSPC => {
                    msg.push_str(": insufficient space on device.");
                }
                libc::EROFS => {
                    msg.push_str(": read-only filesystem; cannot write here.");
                }
                libc::ELOOP => {
                    msg.push_str(": too many symbolic link levels (ELOOP); possible symlink cycle.");
                }
                libc::ENAMETOOLONG => {
                    msg.push_str(": filename or path too long; shorten path segments.");
                }
                libc::EMFILE => {
                    msg.push_str(": process file descriptor limit reached; close files or raise limits.");
                }
                libc::ENFILE => {
                    msg.push_str(": system-wide file table overflow; reduce open files.");
                }
                _ => {}
            }
        }
        #[cfg(windows)]
        {
            match code {
                5 => msg.push_str(": access denied; check permissions."),          // ERROR_ACCESS_DENIED
                17 => msg.push_str(": not same device; cross-filesystem move."),   // ERROR_NOT_SAME_DEVICE
                32 => msg.push_str(": sharing violation; file is in use."),        // ERROR_SHARING_VIOLATION
                2 | 3 => msg.push_str(": path not found; verify it exists."),      // FILE/ PATH NOT FOUND
                80 | 183 => msg.push_str(": already exists; pick a unique name."), // ERROR_FILE_EXISTS / ALREADY_EXISTS
                112 => msg.push_str(": insufficient disk space."),                 // ERROR_DISK_FULL
                19 => msg.push_str(": write protected / read-only media."),        // ERROR_WRITE_PROTECT
                206 => msg.push_str(": filename or path too long (MAX_PATH exceeded)."), // ERROR_FILENAME_EXCED_RANGE
                _ => {}
            }
        }
        msg.push_str(&format!(" [os code: {}]", code));
    } else {
        match e.kind() {
            io::ErrorKind::PermissionDenied => {
                msg.push_str(": permission denied; check ownership and write permissions.");
            }
            io::ErrorKind::NotFound => {
                msg.push_str(": path not found; verify it exists.");
            }
            io::ErrorKind::AlreadyExists => {
                msg.push_str(": already exists; remove or choose a unique name.");
            }
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
                msg.push_str(": busy/timed out; retry after the current write finishes.");
            }
            _ => {}
        }
    }

    msg
}

/// Map an io::Error raised by `op` on `path` to the matching `FsError` kind.
pub(crate) fn map_io_error(op: &str, path: &Path, e: io::Error) -> FsError {
    match e.kind() {
        io::ErrorKind::NotFound => FsError::not_found(path),
        io::ErrorKind::AlreadyExists => FsError::already_exists(path),
        io::ErrorKind::PermissionDenied => FsError::PermissionDenied {
            path: path.to_path_buf(),
            context: build_message(op, path, &e),
        },
        _ => FsError::Io {
            path: path.to_path_buf(),
            message: build_message(op, path, &e),
            source: e,
        },
    }
}

/// Returns a closure suitable for `.map_err(...)` that converts io::Error -> FsError.
pub fn io_error_with_help<'a>(op: &'a str, path: &'a Path) -> impl FnOnce(io::Error) -> FsError + 'a {
    move |e: io::Error| map_io_error(op, path, e)
}
