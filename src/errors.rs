//! Typed error definitions for fs_handles.
//! Every fallible operation reports one of a small set of well-known failure modes
//! so callers can branch on `FsError::kind()` without parsing messages.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::path::ItemKind;

pub type Result<T> = std::result::Result<T, FsError>;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("expected a {expected} at {} but found a {found}", path.display())]
    TypeMismatch {
        path: PathBuf,
        expected: ItemKind,
        found: ItemKind,
    },

    #[error("permission denied on {}: {context}", path.display())]
    PermissionDenied { path: PathBuf, context: String },

    #[error("{message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot (de)serialize {}: {reason}", path.display())]
    SerializationFailure { path: PathBuf, reason: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

/// Discriminant of [`FsError`], handy for matching in callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    TypeMismatch,
    PermissionDenied,
    IoFailure,
    SerializationFailure,
    InvalidPath,
}

impl FsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::NotFound { .. } => ErrorKind::NotFound,
            FsError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            FsError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            FsError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            FsError::Io { .. } => ErrorKind::IoFailure,
            FsError::SerializationFailure { .. } => ErrorKind::SerializationFailure,
            FsError::InvalidPath { .. } => ErrorKind::InvalidPath,
        }
    }

    pub(crate) fn not_found(path: impl Into<PathBuf>) -> Self {
        FsError::NotFound { path: path.into() }
    }

    pub(crate) fn already_exists(path: impl Into<PathBuf>) -> Self {
        FsError::AlreadyExists { path: path.into() }
    }

    pub(crate) fn type_mismatch(path: impl Into<PathBuf>, expected: ItemKind, found: ItemKind) -> Self {
        FsError::TypeMismatch {
            path: path.into(),
            expected,
            found,
        }
    }

    pub(crate) fn serialization(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        FsError::SerializationFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        FsError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::IoFailure => "I/O failure",
            ErrorKind::SerializationFailure => "serialization failure",
            ErrorKind::InvalidPath => "invalid path",
        };
        f.write_str(s)
    }
}
