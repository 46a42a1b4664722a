//! Shared path representation behind both handle kinds.
//!
//! A `PathCore` keeps the string it was built from verbatim and derives the
//! absolute form on demand: `~` expanded, relative paths joined onto the current
//! directory, `.`/`..` collapsed lexically. Symlinks are left alone.

use std::env;
use std::path::{Component, Path, PathBuf};

use super::url;
use super::{name_of, split_extension};
use crate::errors::{FsError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathCore {
    raw: String,
}

impl PathCore {
    /// Wrap `raw`; fails with InvalidPath for an empty string or an interior NUL.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(FsError::invalid_path(raw, "path is empty"));
        }
        if raw.contains('\0') {
            return Err(FsError::invalid_path(raw, "path contains a NUL byte"));
        }
        Ok(Self { raw })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        match path.to_str() {
            Some(s) => Self::new(s),
            None => Err(FsError::invalid_path(
                path.to_string_lossy(),
                "path is not valid UTF-8",
            )),
        }
    }

    /// Build from a `file://` URL.
    pub fn from_url(file_url: &str) -> Result<Self> {
        let path = url::parse_file_url(file_url)?;
        Self::new(path)
    }

    /// The construction string, verbatim.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Absolute, tilde-free, lexically normalized form. Recomputed on every call.
    pub fn absolute_path(&self) -> PathBuf {
        let expanded = expand_tilde(&self.raw);
        let joined = if expanded.is_absolute() {
            expanded
        } else {
            env::current_dir()
                .unwrap_or_else(|_| PathBuf::from(std::path::MAIN_SEPARATOR_STR))
                .join(expanded)
        };
        normalize(&joined)
    }

    pub fn components(&self) -> Vec<String> {
        components_of(Path::new(&self.raw))
    }

    pub fn absolute_components(&self) -> Vec<String> {
        components_of(&self.absolute_path())
    }

    pub fn file_url(&self) -> String {
        url::to_file_url(&self.absolute_path())
    }

    /// Last component of the absolute path; the root names itself.
    pub fn name(&self) -> String {
        name_of(&self.absolute_path())
    }

    pub fn name_without_extension(&self) -> String {
        let name = self.name();
        split_extension(&name).0.to_string()
    }

    /// Extension after the last dot, or "" when there is none.
    pub fn extension(&self) -> String {
        let name = self.name();
        split_extension(&name).1.unwrap_or("").to_string()
    }

    /// Append `name` to the raw path.
    pub fn join(&self, name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(FsError::invalid_path(name, "child name is empty"));
        }
        let mut raw = self.raw.clone();
        if !raw.ends_with(['/', std::path::MAIN_SEPARATOR]) {
            raw.push(std::path::MAIN_SEPARATOR);
        }
        raw.push_str(name.trim_start_matches(['/', std::path::MAIN_SEPARATOR]));
        Self::new(raw)
    }

    /// Containing directory of the absolute path (the root is its own parent).
    pub fn parent(&self) -> Self {
        let abs = self.absolute_path();
        let parent = abs.parent().map(Path::to_path_buf).unwrap_or(abs);
        Self {
            raw: parent.to_string_lossy().into_owned(),
        }
    }
}

fn expand_tilde(raw: &str) -> PathBuf {
    let rest = if raw == "~" {
        Some("")
    } else {
        raw.strip_prefix("~/")
            .or_else(|| if cfg!(windows) { raw.strip_prefix("~\\") } else { None })
    };
    match rest {
        Some(rest) => {
            let home = dirs::home_dir()
                .or_else(|| env::current_dir().ok())
                .unwrap_or_else(|| PathBuf::from(std::path::MAIN_SEPARATOR_STR));
            if rest.is_empty() { home } else { home.join(rest) }
        }
        None => PathBuf::from(raw),
    }
}

/// Collapse `.` and `..` without touching the filesystem.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::Prefix(_) | Component::RootDir => out.push(comp.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // Never climb above the root.
                if out.file_name().is_some() {
                    out.pop();
                }
            }
            Component::Normal(c) => out.push(c),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

fn components_of(path: &Path) -> Vec<String> {
    path.components()
        .map(|c| match c {
            Component::RootDir => std::path::MAIN_SEPARATOR_STR.to_string(),
            other => other.as_os_str().to_string_lossy().into_owned(),
        })
        .collect()
}
