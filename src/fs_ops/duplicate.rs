//! Collision-avoiding name resolution.
//!
//! Policy:
//! - If the requested name is free, use it unchanged.
//! - Otherwise try "base 2", "base 3", ... (linear scan from 2, first free number wins).
//! - For files the number goes before the extension: "report.txt" -> "report 2.txt".
//!
//! `resolve_name` only consults an existence probe, so the answer can be stale by the
//! time the caller creates the item. `claim_unique` fuses resolution with an exclusive
//! create and retries on AlreadyExists, which closes that window.

use std::io;
use tracing::trace;

use crate::path::split_extension;

// Conservative filename limits (bytes, platform-specific and approximate).
#[cfg(windows)]
const MAX_FILENAME_LEN: usize = 240; // leave headroom for legacy MAX_PATH
#[cfg(not(windows))]
const MAX_FILENAME_LEN: usize = 255; // typical POSIX/EXT limits

/// How the numeric suffix is positioned in a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixPlacement {
    /// Before the extension ("report 2.txt"); used for files.
    BeforeExtension,
    /// At the very end ("Photos 2"); used for directories.
    End,
}

/// Return `name` if `exists(name)` is false, otherwise the first "stem N.ext" with
/// N = 2, 3, ... for which `exists` is false.
pub fn resolve_name<F>(name: &str, placement: SuffixPlacement, mut exists: F) -> String
where
    F: FnMut(&str) -> bool,
{
    if !exists(name) {
        return name.to_string();
    }

    let (stem, ext) = split_for(name, placement);
    let mut n: u64 = 2;
    let mut collisions = 0u32;
    loop {
        let candidate = build_name_with_suffix(stem, ext, &format!(" {n}"));
        if !exists(&candidate) {
            return candidate;
        }
        collisions = collisions.saturating_add(1);
        if collisions == 3 {
            trace!(name, "duplicate: experiencing multiple collisions, continuing to search unique suffix");
        }
        n = n.saturating_add(1);
    }
}

/// Like `resolve_name`, but each candidate is handed to `claim`, which must create the
/// item exclusively. A claim failing with AlreadyExists moves on to the next number;
/// any other error is returned. Yields the winning name and the claim's value.
pub fn claim_unique<T, F>(name: &str, placement: SuffixPlacement, mut claim: F) -> io::Result<(String, T)>
where
    F: FnMut(&str) -> io::Result<T>,
{
    match claim(name) {
        Ok(v) => return Ok((name.to_string(), v)),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
        Err(e) => return Err(e),
    }

    let (stem, ext) = split_for(name, placement);
    let mut n: u64 = 2;
    loop {
        let candidate = build_name_with_suffix(stem, ext, &format!(" {n}"));
        match claim(&candidate) {
            Ok(v) => return Ok((candidate, v)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                trace!(candidate = %candidate, "claim lost; trying next suffix");
            }
            Err(e) => return Err(e),
        }
        n = n.saturating_add(1);
    }
}

fn split_for(name: &str, placement: SuffixPlacement) -> (&str, Option<&str>) {
    match placement {
        SuffixPlacement::BeforeExtension => split_extension(name),
        SuffixPlacement::End => (name, None),
    }
}

/// Truncate the stem if needed so `stem + suffix + ["." + ext]` fits within MAX_FILENAME_LEN.
fn build_name_with_suffix(stem: &str, ext: Option<&str>, suffix: &str) -> String {
    let overhead = suffix.len() + ext.map(|e| e.len() + 1).unwrap_or(0);

    let stem = if stem.len() + overhead > MAX_FILENAME_LEN {
        let budget = MAX_FILENAME_LEN.saturating_sub(overhead);
        let mut end = 0;
        for (idx, ch) in stem.char_indices() {
            if idx + ch.len_utf8() > budget {
                break;
            }
            end = idx + ch.len_utf8();
        }
        // Pathologically small budget; keep a minimal marker.
        if end == 0 { "f" } else { &stem[..end] }
    } else {
        stem
    };

    let mut new_name = String::with_capacity(stem.len() + overhead);
    new_name.push_str(stem);
    new_name.push_str(suffix);
    if let Some(e) = ext {
        new_name.push('.');
        new_name.push_str(e);
    }
    new_name
}
