//! Bundles and the work items handed to the processor.

use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::vfs::FileMeta;

/// One constructible page plus the files it owns.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub header: FileMeta,
    pub resources: Vec<FileMeta>,
}

impl Bundle {
    pub fn new(header: FileMeta) -> Self {
        Self {
            header,
            resources: Vec::new(),
        }
    }
}

/// All language variants of one logical bundle, keyed by resolved language.
///
/// Built and consumed inside a single pre-hook call on the traversal
/// thread, then moved into a `WorkItem`; it is never shared.
#[derive(Debug, Clone, Default)]
pub struct BundleSet(BTreeMap<String, Bundle>);

impl BundleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, lang: &str) -> Option<&Bundle> {
        self.0.get(lang)
    }

    pub fn get_mut(&mut self, lang: &str) -> Option<&mut Bundle> {
        self.0.get_mut(lang)
    }

    pub fn insert(&mut self, lang: impl Into<String>, bundle: Bundle) {
        self.0.insert(lang.into(), bundle);
    }

    pub fn contains(&self, lang: &str) -> bool {
        self.0.contains_key(lang)
    }

    pub fn langs(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Bundle> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, String, Bundle> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for BundleSet {
    type Item = (String, Bundle);
    type IntoIter = btree_map::IntoIter<String, Bundle>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Unit of work for the processor.
#[derive(Debug)]
pub enum WorkItem {
    /// A bundle in every language it exists in.
    Bundles(BundleSet),
    /// A loose content or static file.
    File(FileMeta),
}

impl WorkItem {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bundles(_) => "bundles",
            Self::File(_) => "file",
        }
    }
}
