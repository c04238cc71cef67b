//! Page and resource construction.

use super::kind::PageKind;
use super::model::{Page, Resource};
use super::site::Language;
use crate::core::ConstructionError;
use crate::utils::hash::hash_reader;
use crate::utils::path::strip_dir;
use crate::vfs::FileMeta;

/// Builds pages and resources from metadata records.
///
/// Called concurrently from worker threads.
pub trait PageFactory: Send + Sync {
    /// Build a page from a header or content file. `owner` is set for
    /// content files owned by a bundle.
    fn new_page(
        &self,
        meta: &FileMeta,
        site: &Language,
        owner: Option<&Page>,
    ) -> Result<Page, ConstructionError>;

    /// Build a non-page resource owned by `owner`.
    fn new_resource(
        &self,
        meta: &FileMeta,
        site: &Language,
        owner: &Page,
    ) -> Result<Resource, ConstructionError>;
}

/// Default factory: reads each page once to record its blake3 hash.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentPageFactory;

impl PageFactory for ContentPageFactory {
    fn new_page(
        &self,
        meta: &FileMeta,
        site: &Language,
        owner: Option<&Page>,
    ) -> Result<Page, ConstructionError> {
        let Some(kind) = PageKind::of(meta.classifier, &meta.logical_path, owner.is_some()) else {
            panic!(
                "cannot build a page from {} `{}`",
                meta.classifier,
                meta.logical_path.display()
            );
        };

        let reader = meta.open().map_err(|source| ConstructionError::Open {
            path: meta.logical_path.clone(),
            source,
        })?;
        let (content_hash, content_len) =
            hash_reader(reader).map_err(|source| ConstructionError::Read {
                path: meta.logical_path.clone(),
                source,
            })?;

        Ok(Page {
            meta: meta.clone(),
            lang: site.code.clone(),
            kind,
            owner: owner.map(|o| o.logical_path().to_path_buf()),
            resource_path: owner.map(|o| strip_dir(&meta.logical_path, o.dir())),
            content_hash,
            content_len,
            resources: Vec::new(),
        })
    }

    fn new_resource(
        &self,
        meta: &FileMeta,
        site: &Language,
        owner: &Page,
    ) -> Result<Resource, ConstructionError> {
        Ok(Resource {
            meta: meta.clone(),
            lang: site.code.clone(),
            owner: owner.logical_path().to_path_buf(),
            target: strip_dir(&meta.logical_path, owner.dir()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor, Read};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use crate::vfs::ContentClass;

    fn file(path: &str, class: ContentClass, body: &'static str) -> FileMeta {
        let mut meta = FileMeta::new(
            Path::new(path).file_name().unwrap().to_string_lossy(),
            class,
        )
        .with_open(Arc::new(move || {
            Ok(Box::new(Cursor::new(body.as_bytes())) as Box<dyn Read + Send>)
        }));
        meta.logical_path = PathBuf::from(path);
        meta
    }

    #[test]
    fn test_page_records_hash_and_kind() {
        let en = Language::new("en");
        let meta = file("posts/a/index.md", ContentClass::LeafBundleHeader, "# hi");
        let page = ContentPageFactory.new_page(&meta, &en, None).unwrap();

        assert_eq!(page.kind, PageKind::Page);
        assert_eq!(page.lang, "en");
        assert_eq!(page.content_len, 4);
        assert_eq!(page.content_hash.as_bytes(), blake3::hash(b"# hi").as_bytes());
        assert_eq!(page.owner, None);
        assert_eq!(page.dir(), Path::new("posts/a"));
    }

    #[test]
    fn test_bundled_page_and_resource_paths() {
        let fr = Language::new("fr");
        let header = file("posts/a/index.md", ContentClass::LeafBundleHeader, "");
        let owner = ContentPageFactory.new_page(&header, &fr, None).unwrap();

        let extra = file("posts/a/notes/extra.md", ContentClass::Content, "x");
        let page = ContentPageFactory.new_page(&extra, &fr, Some(&owner)).unwrap();
        assert_eq!(page.kind, PageKind::Bundled);
        assert_eq!(page.owner.as_deref(), Some(Path::new("posts/a/index.md")));
        assert_eq!(page.resource_path.as_deref(), Some(Path::new("notes/extra.md")));

        let img = file("posts/a/img/cover.jpg", ContentClass::StaticFile, "");
        let res = ContentPageFactory.new_resource(&img, &fr, &owner).unwrap();
        assert_eq!(res.target, PathBuf::from("img/cover.jpg"));
        assert_eq!(res.lang, "fr");
    }

    #[test]
    fn test_open_failure_is_construction_error() {
        let mut meta = FileMeta::new("broken.md", ContentClass::Content)
            .with_open(Arc::new(|| Err::<Box<dyn Read + Send>, _>(io::Error::other("gone"))));
        meta.logical_path = PathBuf::from("broken.md");

        let err = ContentPageFactory
            .new_page(&meta, &Language::new("en"), None)
            .unwrap_err();
        assert!(matches!(err, ConstructionError::Open { .. }));
        assert_eq!(err.path(), Path::new("broken.md"));
    }

    #[test]
    #[should_panic(expected = "cannot build a page")]
    fn test_static_file_is_not_a_page() {
        let meta = file("a.jpg", ContentClass::StaticFile, "");
        let _ = ContentPageFactory.new_page(&meta, &Language::new("en"), None);
    }
}
