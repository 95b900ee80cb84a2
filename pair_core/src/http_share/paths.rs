//! Lexical path handling for the share routes.
//!
//! Nothing here touches the filesystem: containment is decided on cleaned
//! paths so that `..` tricks are resolved before any `stat` or `open`.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Characters left as-is inside a single URL path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b',')
    .remove(b':')
    .remove(b';')
    .remove(b'=')
    .remove(b'@');

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathDecodeError {
    #[error("invalid escape sequence at byte {0}")]
    InvalidEscape(usize),
    #[error("decoded path is not valid UTF-8")]
    InvalidUtf8,
}

/// Remove `.` segments and resolve `..` against preceding segments.
///
/// `..` never climbs above a root; on a relative path leading `..` are kept.
/// An empty result becomes `.`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().map(|c| c.as_os_str()).collect()
}

/// Append `rel` to `base` and normalize the result.
///
/// A leading root or drive prefix on `rel` is ignored, so `/etc/passwd`
/// lands under `base` instead of replacing it.
pub fn join_clean(base: &Path, rel: &Path) -> PathBuf {
    let mut joined = base.to_path_buf();
    for component in rel.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {}
            other => joined.push(other.as_os_str()),
        }
    }
    normalize(&joined)
}

/// Path of `candidate` below `root`, or `None` when the candidate is the root
/// itself or lies outside it. Both paths are expected to be normalized.
pub fn strict_descendant(root: &Path, candidate: &Path) -> Option<PathBuf> {
    let rel = candidate.strip_prefix(root).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    Some(rel.to_path_buf())
}

/// Percent-decode a raw request path, rejecting malformed `%` escapes.
pub fn decode(raw: &str) -> Result<String, PathDecodeError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(PathDecodeError::InvalidEscape(i));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| PathDecodeError::InvalidUtf8)
}

/// Escape a configured relative path so it survives as one URL path segment.
pub fn escape(rel_path: &str) -> String {
    utf8_percent_encode(rel_path, PATH_SEGMENT).to_string()
}

/// Reduce a client supplied upload name to a single path segment.
///
/// Returns `None` for names with nothing usable left (empty, `.` or `..`).
pub fn upload_file_name(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let name: String = name.chars().filter(|c| !c.is_control()).collect();

    if name.trim().is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name)
}
