//! Live metadata snapshots and their raw attribute-map form.

use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::ItemKind;
use crate::codec::Value;
use crate::fs_ops::metadata::xattr_names;

/// Metadata of an on-disk item, fetched when requested and never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub kind: ItemKind,
    pub size: u64,
    pub created: Option<DateTime<Local>>,
    pub modified: Option<DateTime<Local>>,
    pub accessed: Option<DateTime<Local>>,
    pub readonly: bool,
    /// Permission bits (Unix only).
    pub mode: Option<u32>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub inode: Option<u64>,
    pub link_count: Option<u64>,
    /// Extended attribute names (populated with the "xattrs" feature).
    pub xattrs: Vec<String>,
}

impl Metadata {
    pub(crate) fn read(path: &Path, meta: &fs::Metadata) -> Self {
        #[cfg_attr(not(unix), allow(unused_mut))]
        let mut out = Metadata {
            kind: ItemKind::of(meta),
            size: meta.len(),
            created: meta.created().ok().map(DateTime::<Local>::from),
            modified: meta.modified().ok().map(DateTime::<Local>::from),
            accessed: meta.accessed().ok().map(DateTime::<Local>::from),
            readonly: meta.permissions().readonly(),
            mode: None,
            uid: None,
            gid: None,
            inode: None,
            link_count: None,
            xattrs: xattr_names(path),
        };
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            out.mode = Some(meta.mode() & 0o7777);
            out.uid = Some(meta.uid());
            out.gid = Some(meta.gid());
            out.inode = Some(meta.ino());
            out.link_count = Some(meta.nlink());
        }
        out
    }

    /// The same data as a string-keyed map of plain values.
    /// Timestamps are RFC 3339 strings; absent fields are omitted.
    pub fn to_attributes(&self) -> BTreeMap<String, Value> {
        let mut map = BTreeMap::new();
        map.insert("kind".to_string(), Value::from(self.kind.to_string()));
        map.insert("size".to_string(), Value::Integer(clamp_i64(self.size)));
        map.insert("readonly".to_string(), Value::from(self.readonly));
        let dates = [
            ("created", self.created),
            ("modified", self.modified),
            ("accessed", self.accessed),
        ];
        for (key, date) in dates {
            if let Some(d) = date {
                map.insert(key.to_string(), Value::from(d.to_rfc3339()));
            }
        }
        let numbers = [
            ("mode", self.mode.map(u64::from)),
            ("uid", self.uid.map(u64::from)),
            ("gid", self.gid.map(u64::from)),
            ("inode", self.inode),
            ("link_count", self.link_count),
        ];
        for (key, n) in numbers {
            if let Some(n) = n {
                map.insert(key.to_string(), Value::Integer(clamp_i64(n)));
            }
        }
        if !self.xattrs.is_empty() {
            map.insert("xattrs".to_string(), Value::from(self.xattrs.clone()));
        }
        map
    }
}

fn clamp_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
