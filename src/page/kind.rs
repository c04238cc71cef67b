//! Page kind.

use std::path::Path;

use serde::Serialize;

use crate::vfs::ContentClass;

/// Where a page sits in the content tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// Branch bundle header at the content root.
    Home,
    /// Any other branch bundle header.
    Section,
    /// Leaf bundle header or standalone content file.
    Page,
    /// Content file owned by a bundle.
    Bundled,
}

impl PageKind {
    /// Kind of a page built from `classifier` at `logical_path`.
    ///
    /// Returns `None` for classifiers that never become pages.
    pub fn of(classifier: ContentClass, logical_path: &Path, bundled: bool) -> Option<Self> {
        match classifier {
            ContentClass::Content if bundled => Some(Self::Bundled),
            ContentClass::Content | ContentClass::LeafBundleHeader => Some(Self::Page),
            ContentClass::BranchBundleHeader => {
                let at_root = logical_path
                    .parent()
                    .is_none_or(|p| p.as_os_str().is_empty());
                Some(if at_root { Self::Home } else { Self::Section })
            }
            ContentClass::StaticFile | ContentClass::Directory => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Section => "section",
            Self::Page => "page",
            Self::Bundled => "bundled",
        }
    }

    #[inline]
    pub fn is_branch(self) -> bool {
        matches!(self, Self::Home | Self::Section)
    }
}
