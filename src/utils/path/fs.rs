//! Filesystem path helpers.

use std::path::{Path, PathBuf};

/// Absolute form of `path`.
///
/// Canonicalizes when the path exists (resolving symlinks, `.` and `..`),
/// otherwise joins relative paths onto the current directory.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Resolve a configured path against the site root.
///
/// Absolute paths are kept; relative ones are taken relative to `root`.
#[inline]
pub fn resolve_under(path: &Path, root: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        normalize_path(&root.join(path))
    }
}

/// `path` relative to `dir`, or `path` itself when it is not inside `dir`.
#[inline]
pub fn strip_dir(path: &Path, dir: &Path) -> PathBuf {
    path.strip_prefix(dir).unwrap_or(path).to_path_buf()
}
