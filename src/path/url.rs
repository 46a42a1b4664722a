//! `file://` URL conversion (RFC 8089 subset: empty or `localhost` host, percent-encoded path).

use std::path::Path;

use crate::errors::{FsError, Result};

const SCHEME: &str = "file://";

/// Bytes left unescaped in a path: RFC 3986 unreserved plus the separators.
fn is_unescaped(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b'/')
}

pub(crate) fn to_file_url(abs: &Path) -> String {
    let mut path = abs.to_string_lossy().into_owned();
    if cfg!(windows) {
        path = path.replace('\\', "/");
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
    }
    let mut out = String::with_capacity(SCHEME.len() + path.len());
    out.push_str(SCHEME);
    for &b in path.as_bytes() {
        if is_unescaped(b) || (cfg!(windows) && b == b':') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

pub(crate) fn parse_file_url(url: &str) -> Result<String> {
    let invalid = |reason: &str| FsError::invalid_path(url, reason);

    let scheme_ok = url
        .get(..SCHEME.len())
        .is_some_and(|s| s.eq_ignore_ascii_case(SCHEME));
    if !scheme_ok {
        return Err(invalid("not a file:// URL"));
    }
    let rest = &url[SCHEME.len()..];
    let rest = rest.split(['?', '#']).next().unwrap_or("");
    let path = match rest.find('/') {
        Some(0) => rest,
        Some(i) if rest[..i].eq_ignore_ascii_case("localhost") => &rest[i..],
        _ => return Err(invalid("file URL names a remote host")),
    };

    let decoded = percent_decode(path).ok_or_else(|| invalid("malformed percent escape"))?;
    let decoded = String::from_utf8(decoded).map_err(|_| invalid("decoded path is not UTF-8"))?;

    // "/C:/dir" -> "C:/dir"
    if cfg!(windows) {
        let b = decoded.as_bytes();
        if b.len() >= 3 && b[0] == b'/' && b[1].is_ascii_alphabetic() && b[2] == b':' {
            return Ok(decoded[1..].to_string());
        }
    }
    Ok(decoded)
}

fn percent_decode(s: &str) -> Option<Vec<u8>> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = s.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Some(out)
}
