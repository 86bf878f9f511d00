//! Root-relative path management
//!
//! Every path handed across the directory service boundary is slash-normalized
//! and relative to the watched root; the empty string is the root itself.

use crate::util::errors::{TreelineError, TreelineResult};

/// Characters rejected in entry names on every platform.
pub const ILLEGAL_NAME_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Normalize a root-relative path: backslashes become slashes, redundant
/// separators and `.` segments are dropped. `..` segments and rooted input
/// (a leading separator or a drive prefix) are rejected so a caller can
/// never name anything outside the watched root.
pub fn normalize_rel(path: &str) -> TreelineResult<String> {
    let unified = path.replace('\\', "/");
    let has_drive_prefix = unified.as_bytes().first().is_some_and(u8::is_ascii_alphabetic)
        && unified.as_bytes().get(1) == Some(&b':');
    if unified.starts_with('/') || has_drive_prefix {
        return Err(TreelineError::InvalidPath(format!(
            "path is not root-relative: {}",
            path
        )));
    }
    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(TreelineError::InvalidPath(format!(
                    "path escapes the root: {}",
                    path
                )))
            }
            other => segments.push(other),
        }
    }
    Ok(segments.join("/"))
}

/// Join a root-relative directory path and an entry name.
pub fn join_rel(dir_path: &str, name: &str) -> String {
    if dir_path.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir_path, name)
    }
}

/// Root-relative parent of a path; the empty string for top-level entries.
pub fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Last path segment including the extension.
pub fn name_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Lower-cased extension including the dot; empty if the name has none.
/// A leading dot alone (e.g. `.gitignore`) does not count as an extension.
pub fn extension_of(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[idx..].to_lowercase(),
        _ => String::new(),
    }
}

/// Hidden entries are dot-prefixed by convention.
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

/// Validate a user-supplied entry name before it reaches the directory
/// service: non-empty, no path separators, none of the cross-platform-unsafe
/// characters.
pub fn validate_entry_name(name: &str) -> TreelineResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TreelineError::InvalidName("name is empty".to_string()));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(TreelineError::InvalidName(format!(
            "\"{}\" is not a usable name",
            trimmed
        )));
    }
    if let Some(bad) = name.chars().find(|c| ILLEGAL_NAME_CHARS.contains(c)) {
        return Err(TreelineError::InvalidName(format!(
            "name contains illegal character '{}'",
            bad
        )));
    }
    Ok(())
}
