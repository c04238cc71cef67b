//! `[content]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [content]
//! base_path = ""              # Prefix stripped from logical paths
//!
//! [[content.mounts]]
//! source = "content"          # Directory, relative to the site root
//! lang = ""                   # Language of files without a suffix ("" = default)
//! weight = 0                  # Higher wins when mounts provide the same file
//!
//! [[content.mounts]]
//! source = "content-fr"
//! lang = "fr"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::section::LanguagesConfig;
use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::path::resolve_under;
use crate::vfs::Mount;

/// One `[[content.mounts]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountConfig {
    pub source: PathBuf,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub weight: i32,
}

impl MountConfig {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            lang: String::new(),
            weight: 0,
        }
    }

    pub fn to_mount(&self) -> Mount {
        Mount::new(&self.source)
            .with_lang(&self.lang)
            .with_weight(self.weight)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub base_path: PathBuf,
    pub mounts: Vec<MountConfig>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::new(),
            mounts: vec![MountConfig::new("content")],
        }
    }
}

impl ContentConfig {
    const MOUNTS: FieldPath = FieldPath::new("content.mounts");
    const MOUNT_SOURCE: FieldPath = FieldPath::new("content.mounts.source");
    const MOUNT_LANG: FieldPath = FieldPath::new("content.mounts.lang");

    /// Replace all mounts with a single unlabelled one (`--content`).
    pub fn override_source(&mut self, source: impl Into<PathBuf>) {
        self.mounts = vec![MountConfig::new(source)];
    }

    /// Resolve mount sources against the site root.
    pub fn normalize(&mut self, root: &Path) {
        for mount in &mut self.mounts {
            mount.source = resolve_under(&mount.source, root);
        }
    }

    pub fn mounts(&self) -> Vec<Mount> {
        self.mounts.iter().map(MountConfig::to_mount).collect()
    }

    pub fn validate(&self, languages: &LanguagesConfig, diag: &mut ConfigDiagnostics) {
        if self.mounts.is_empty() {
            diag.error_with_hint(
                Self::MOUNTS,
                "no content mounts configured",
                "add a [[content.mounts]] entry with a `source` directory",
            );
        }

        for mount in &self.mounts {
            if !mount.source.is_dir() {
                diag.error(
                    Self::MOUNT_SOURCE,
                    format!("`{}` is not a directory", mount.source.display()),
                );
            }
            if mount.lang.is_empty() {
                continue;
            }
            if !languages.is_known(&mount.lang) {
                diag.error_with_hint(
                    Self::MOUNT_LANG,
                    format!("unknown language `{}`", mount.lang),
                    format!("add a [languages.{}] table", mount.lang),
                );
            } else if languages.is_disabled(&mount.lang) {
                diag.warn(
                    Self::MOUNT_LANG,
                    format!(
                        "mount `{}` provides disabled language `{}`",
                        mount.source.display(),
                        mount.lang
                    ),
                );
            }
        }
    }
}
