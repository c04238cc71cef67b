//! Constructed pages and resources.

use std::path::{Path, PathBuf};

use super::kind::PageKind;
use crate::utils::hash::ContentHash;
use crate::vfs::FileMeta;

/// A page built from a bundle header or a content file.
#[derive(Debug, Clone)]
pub struct Page {
    pub meta: FileMeta,
    /// Resolved language (never empty).
    pub lang: String,
    pub kind: PageKind,
    /// Logical path of the owning page, for bundled pages.
    pub owner: Option<PathBuf>,
    /// Path relative to the owner's directory, for bundled pages.
    pub resource_path: Option<PathBuf>,
    pub content_hash: ContentHash,
    pub content_len: u64,
    pub resources: Vec<PageResource>,
}

/// Something a bundle header owns.
#[derive(Debug, Clone)]
pub enum PageResource {
    Page(Box<Page>),
    File(Resource),
}

/// A non-page file owned by a bundle.
#[derive(Debug, Clone)]
pub struct Resource {
    pub meta: FileMeta,
    pub lang: String,
    /// Logical path of the owning page.
    pub owner: PathBuf,
    /// Path relative to the owner's directory.
    pub target: PathBuf,
}

impl Page {
    pub fn logical_path(&self) -> &Path {
        &self.meta.logical_path
    }

    /// Directory the page's resources are relative to.
    pub fn dir(&self) -> &Path {
        self.meta.logical_path.parent().unwrap_or(Path::new(""))
    }

    pub fn push_resource(&mut self, resource: PageResource) {
        self.resources.push(resource);
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn files(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter_map(|r| match r {
            PageResource::File(res) => Some(res),
            PageResource::Page(_) => None,
        })
    }

    pub fn bundled_pages(&self) -> impl Iterator<Item = &Page> {
        self.resources.iter().filter_map(|r| match r {
            PageResource::Page(page) => Some(page.as_ref()),
            PageResource::File(_) => None,
        })
    }
}

impl PageResource {
    pub fn logical_path(&self) -> &Path {
        match self {
            Self::Page(page) => page.logical_path(),
            Self::File(res) => &res.meta.logical_path,
        }
    }
}
