//! Path normalization utilities
//!
//! All relative paths are '/'-separated and rooted at the scan root; the empty
//! string denotes the root itself.

use std::path::{Path, PathBuf};

/// Normalize a path to use '/' as separator (for cross-platform consistency)
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Make a path relative to the root directory
pub fn make_relative(path: &Path, root: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(normalize_path)
}

/// Join a relative '/'-path onto a base directory
pub fn join_normalized(base: &Path, relative: &str) -> PathBuf {
    if relative.is_empty() {
        return base.to_path_buf();
    }
    base.join(relative.replace('/', std::path::MAIN_SEPARATOR_STR))
}

/// Split a relative path into its segments ("" has none)
pub fn segments(relative: &str) -> impl Iterator<Item = &str> {
    relative.split('/').filter(|s| !s.is_empty())
}

/// Number of parent directories between the root and this path.
///
/// Files directly under the root have depth 0.
pub fn depth(relative: &str) -> usize {
    segments(relative).count().saturating_sub(1)
}

/// Proper ancestor directories of a relative path, outermost first.
///
/// `"a/b/c.txt"` yields `["a", "a/b"]`.
pub fn ancestors(relative: &str) -> Vec<&str> {
    relative
        .match_indices('/')
        .map(|(idx, _)| &relative[..idx])
        .filter(|prefix| !prefix.is_empty())
        .collect()
}

/// Extension without the dot, lowercased.
///
/// Dotfiles with a single dot (`.gitignore`) use the part after the dot.
pub fn extension(relative: &str) -> String {
    let name = relative.rsplit('/').next().unwrap_or(relative);
    if let Some(rest) = name.strip_prefix('.') {
        if !rest.contains('.') {
            return rest.to_lowercase();
        }
    }
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[idx + 1..].to_lowercase(),
        _ => String::new(),
    }
}
