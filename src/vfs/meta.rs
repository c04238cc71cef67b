//! Per-node metadata attached during traversal.

use std::cmp::Ordering;
use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

/// Role of a file in the content tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentClass {
    Directory,
    /// `_index.<ext>`: owns its directory's files, subdirectories walk on.
    BranchBundleHeader,
    /// `index.<ext>`: owns the whole subtree.
    LeafBundleHeader,
    Content,
    #[default]
    StaticFile,
}

impl ContentClass {
    /// Sort rank: bundle headers first, everything else ties.
    pub const fn rank(self) -> u8 {
        match self {
            Self::BranchBundleHeader => 0,
            Self::LeafBundleHeader => 1,
            Self::Content | Self::StaticFile | Self::Directory => 2,
        }
    }

    pub const fn is_bundle_header(self) -> bool {
        matches!(self, Self::BranchBundleHeader | Self::LeafBundleHeader)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Directory => "dir",
            Self::BranchBundleHeader => "branch",
            Self::LeafBundleHeader => "leaf",
            Self::Content => "content",
            Self::StaticFile => "file",
        }
    }
}

impl fmt::Display for ContentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opens a byte stream for a node on demand.
pub type OpenContent = Arc<dyn Fn() -> io::Result<Box<dyn Read + Send>> + Send + Sync>;

/// Metadata record for one file or directory.
///
/// `classifier` and `lang` are always set by the filesystem adapter before a
/// record reaches a hook. Clones share the `open` capability.
#[derive(Clone, Default)]
pub struct FileMeta {
    /// Name as listed, before symlink resolution.
    pub name: String,
    /// Name of the resolved entry (the symlink target's name for links).
    pub entry_name: String,
    pub classifier: ContentClass,
    /// Empty means the default content language.
    pub lang: String,
    /// Higher wins between duplicates from overlaid mounts.
    pub weight: i32,
    /// File name with any language suffix removed (`post.fr.md` -> `post.md`).
    pub translation_base_name: String,
    /// Languages that provide a file with the same translation base name.
    pub translations: Vec<String>,
    /// Root-relative path with the walker's base path stripped.
    pub logical_path: PathBuf,
    /// Path the walker used to reach this node.
    pub walk_path: PathBuf,
    /// Canonical on-disk location. Identity for cycle detection.
    pub physical_path: PathBuf,
    /// Listing already comes in canonical order (directories only).
    pub ordered: bool,
    /// Excluded from recursion. Only ever set, never cleared.
    pub skip: bool,
    open: Option<OpenContent>,
}

impl FileMeta {
    pub fn new(name: impl Into<String>, classifier: ContentClass) -> Self {
        let name = name.into();
        Self {
            entry_name: name.clone(),
            translation_base_name: name.clone(),
            name,
            classifier,
            ..Self::default()
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_open(mut self, open: OpenContent) -> Self {
        self.open = Some(open);
        self
    }

    pub fn is_dir(&self) -> bool {
        self.classifier == ContentClass::Directory
    }

    /// Name used when joining paths: the listed name, else the entry name.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.entry_name
        } else {
            &self.name
        }
    }

    pub fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        match &self.open {
            Some(open) => open(),
            None => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("`{}` has no content", self.logical_path.display()),
            )),
        }
    }

    /// Shallow copy with an overridden language.
    pub fn clone_with_lang(&self, lang: &str) -> Self {
        let mut meta = self.clone();
        meta.lang = lang.to_owned();
        meta
    }

    /// True when `lang` provides its own file for this translation base name.
    pub fn has_translation(&self, lang: &str) -> bool {
        self.translations.iter().any(|l| l == lang)
    }

    /// Identity for cycle detection, `None` when the adapter has none.
    pub fn identity(&self) -> Option<&Path> {
        (!self.physical_path.as_os_str().is_empty()).then_some(self.physical_path.as_path())
    }
}

impl fmt::Debug for FileMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileMeta")
            .field("name", &self.name)
            .field("classifier", &self.classifier)
            .field("lang", &self.lang)
            .field("weight", &self.weight)
            .field("logical_path", &self.logical_path)
            .field("physical_path", &self.physical_path)
            .field("skip", &self.skip)
            .finish_non_exhaustive()
    }
}

/// Deterministic listing order.
///
/// 1. classifier rank (bundle headers first)
/// 2. weight, descending
/// 3. listed name, when both have one
/// 4. entry name
pub fn compare_entries(a: &FileMeta, b: &FileMeta) -> Ordering {
    a.classifier
        .rank()
        .cmp(&b.classifier.rank())
        .then_with(|| b.weight.cmp(&a.weight))
        .then_with(|| {
            if !a.name.is_empty() && !b.name.is_empty() {
                a.name.cmp(&b.name)
            } else {
                Ordering::Equal
            }
        })
        .then_with(|| a.entry_name.cmp(&b.entry_name))
}

pub fn sort_entries(entries: &mut [FileMeta]) {
    entries.sort_by(compare_entries);
}
