use std::io::{self, Read};
use std::path::Path;

use super::meta::FileMeta;

/// Filesystem collaborator consumed by the walker.
///
/// Every returned `FileMeta` already carries its classifier and language.
pub trait SourceFs: Send + Sync {
    /// Stat following symlinks.
    fn stat(&self, path: &Path) -> io::Result<FileMeta>;

    /// Stat that reports a symlink under its own name when the adapter can.
    fn lstat_if_possible(&self, path: &Path) -> io::Result<FileMeta> {
        self.stat(path)
    }

    /// List a directory. Order is unspecified unless the adapter marks the
    /// directory's record `ordered`.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<FileMeta>>;

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;
}
