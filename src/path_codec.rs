//! path_codec — record key <-> relative path for the directory layouts.
//!
//! Escaping, per path segment:
//! - empty key            -> `?`
//! - `?`                  -> `??`
//! - `/`                  -> `?\`
//! - leading `.`          -> `?.` (extra `?` in front)
//!
//! Type 1 (nested) caps every escaped segment at 14 bytes: the key is cut into the
//! longest prefixes whose escaped form fits; a last segment of exactly 14 bytes
//! gets an extra `?` (empty) segment so "exactly fits" and "more follows" differ.
//! Type 19 (flat) escapes the whole key as one segment.
//!
//! Unescaping is a single left-to-right pass, so it inverts escaping exactly.

use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};

use crate::consts::TYPE1_SEGMENT_MAX;

/// Escape one key (or key fragment) into one path segment.
pub fn escape_segment(key: &[u8]) -> Vec<u8> {
    if key.is_empty() {
        return b"?".to_vec();
    }
    let mut out = Vec::with_capacity(key.len() + 2);
    if key[0] == b'.' {
        out.push(b'?');
    }
    for &b in key {
        match b {
            b'?' => out.extend_from_slice(b"??"),
            b'/' => out.extend_from_slice(b"?\\"),
            _ => out.push(b),
        }
    }
    out
}

/// Inverse of [`escape_segment`]. `?` and `?0` both decode to the empty key.
pub fn unescape_segment(seg: &[u8]) -> Vec<u8> {
    if seg == b"?" || seg == b"?0" {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(seg.len());
    let mut i = 0usize;
    if seg.starts_with(b"?.") {
        i = 1;
    }
    while i < seg.len() {
        if seg[i] == b'?' && i + 1 < seg.len() {
            match seg[i + 1] {
                b'?' => {
                    out.push(b'?');
                    i += 2;
                    continue;
                }
                b'\\' => {
                    out.push(b'/');
                    i += 2;
                    continue;
                }
                _ => {}
            }
        }
        out.push(seg[i]);
        i += 1;
    }
    out
}

/// Escaped segments of `key` in the nested (type 1) layout.
pub fn type1_segments(key: &[u8]) -> Vec<Vec<u8>> {
    let mut parts = Vec::new();
    let mut rest = key;
    loop {
        // longest prefix (1..=14 bytes) whose escaped form fits; one byte always does
        let mut take = rest.len().clamp(1, TYPE1_SEGMENT_MAX);
        let mut escaped = escape_segment(&rest[..take.min(rest.len())]);
        while escaped.len() > TYPE1_SEGMENT_MAX && take > 1 {
            take -= 1;
            escaped = escape_segment(&rest[..take]);
        }
        rest = &rest[take.min(rest.len())..];

        let exact = escaped.len() == TYPE1_SEGMENT_MAX;
        parts.push(escaped);
        if rest.is_empty() {
            if exact {
                parts.push(escape_segment(b""));
            }
            break;
        }
    }
    parts
}

/// Relative path of `key` in a type 1 file.
pub fn key_to_type1_path(key: &[u8]) -> PathBuf {
    type1_segments(key)
        .into_iter()
        .map(segment_to_os)
        .collect()
}

/// Relative path (one segment) of `key` in a type 19 file.
pub fn key_to_type19_path(key: &[u8]) -> PathBuf {
    PathBuf::from(segment_to_os(escape_segment(key)))
}

/// Recover a key from a relative path of either layout: unescape every segment
/// and concatenate.
pub fn path_to_key(path: &Path) -> Vec<u8> {
    let mut key = Vec::new();
    for c in path.components() {
        if let Component::Normal(seg) = c {
            key.extend_from_slice(&unescape_segment(&os_to_bytes(seg)));
        }
    }
    key
}

// ---------- OS string conversion ----------

#[cfg(unix)]
pub(crate) fn segment_to_os(seg: Vec<u8>) -> OsString {
    use std::os::unix::ffi::OsStringExt;
    OsString::from_vec(seg)
}

#[cfg(not(unix))]
pub(crate) fn segment_to_os(seg: Vec<u8>) -> OsString {
    OsString::from(String::from_utf8_lossy(&seg).into_owned())
}

#[cfg(unix)]
pub(crate) fn os_to_bytes(s: &OsStr) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(s.as_bytes())
}

#[cfg(not(unix))]
pub(crate) fn os_to_bytes(s: &OsStr) -> Cow<'_, [u8]> {
    match s.to_string_lossy() {
        Cow::Borrowed(b) => Cow::Borrowed(b.as_bytes()),
        Cow::Owned(o) => Cow::Owned(o.into_bytes()),
    }
}
