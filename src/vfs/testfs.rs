//! In-memory `SourceFs` for walker and collector tests.

use std::collections::BTreeMap;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::classify::{classify, split_lang};
use super::meta::{ContentClass, FileMeta};
use super::source::SourceFs;

const LANGS: &[&str] = &["en", "fr", "de"];

struct Node {
    meta: FileMeta,
    /// Directory symlink target.
    link: Option<PathBuf>,
}

/// Tree keyed by path. Directory symlinks are resolved on every access so
/// cycles can be modelled.
pub struct MemFs {
    nodes: BTreeMap<PathBuf, Node>,
    fail_read_dir: FxHashSet<PathBuf>,
    ordered: bool,
}

impl MemFs {
    pub fn new() -> Self {
        let mut fs = Self {
            nodes: BTreeMap::new(),
            fail_read_dir: FxHashSet::default(),
            ordered: false,
        };
        fs.insert_dir(Path::new(""));
        fs
    }

    /// Listings are returned as stored and marked ordered.
    pub fn ordered(mut self) -> Self {
        self.ordered = true;
        self
    }

    fn insert_dir(&mut self, path: &Path) {
        let mut meta = FileMeta::new(file_name(path), ContentClass::Directory);
        meta.physical_path = Path::new("/mem").join(path);
        self.nodes.insert(path.to_path_buf(), Node { meta, link: None });
    }

    fn ensure_parents(&mut self, path: &Path) {
        let mut cur = PathBuf::new();
        if let Some(parent) = path.parent() {
            for comp in parent.components() {
                cur.push(comp);
                if !self.nodes.contains_key(&cur) {
                    self.insert_dir(&cur);
                }
            }
        }
    }

    pub fn dir(mut self, path: &str) -> Self {
        let path = Path::new(path);
        self.ensure_parents(path);
        self.insert_dir(path);
        self
    }

    pub fn file(self, path: &str, content: &str) -> Self {
        self.file_with(path, content, |_| {})
    }

    /// Add a file; language and classifier come from the name, `edit` can
    /// override anything.
    pub fn file_with(mut self, path: &str, content: &str, edit: impl FnOnce(&mut FileMeta)) -> Self {
        let path = Path::new(path);
        self.ensure_parents(path);

        let name = file_name(path);
        let (lang, base) = split_lang(&name, LANGS);
        let bytes = Arc::new(content.as_bytes().to_vec());
        let mut meta = FileMeta::new(name, classify(&base, false))
            .with_lang(lang.unwrap_or_default())
            .with_open(Arc::new(move || {
                Ok(Box::new(Cursor::new(bytes.as_ref().clone())) as Box<dyn Read + Send>)
            }));
        meta.translation_base_name = base;
        meta.physical_path = Path::new("/mem").join(path);
        edit(&mut meta);
        self.nodes.insert(path.to_path_buf(), Node { meta, link: None });
        self
    }

    /// Directory symlink at `path` pointing to `target`.
    pub fn link(mut self, path: &str, target: &str) -> Self {
        let path = Path::new(path);
        self.ensure_parents(path);
        let mut meta = FileMeta::new(file_name(path), ContentClass::Directory);
        meta.entry_name = file_name(Path::new(target));
        self.nodes.insert(
            path.to_path_buf(),
            Node {
                meta,
                link: Some(PathBuf::from(target)),
            },
        );
        self
    }

    pub fn fail_read_dir(mut self, path: &str) -> Self {
        self.fail_read_dir.insert(PathBuf::from(path));
        self
    }

    /// Follow directory links component by component.
    fn resolve(&self, path: &Path) -> PathBuf {
        let mut cur = PathBuf::new();
        for comp in path.components() {
            cur.push(comp);
            if let Some(Node {
                link: Some(target), ..
            }) = self.nodes.get(&cur)
            {
                cur = target.clone();
            }
        }
        cur
    }

    fn meta_at(&self, path: &Path) -> io::Result<FileMeta> {
        let node = self
            .nodes
            .get(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))?;
        let mut meta = node.meta.clone();
        if let Some(target) = &node.link {
            let real = self.resolve(target);
            meta.physical_path = Path::new("/mem").join(&real);
        }
        meta.ordered = self.ordered;
        Ok(meta)
    }
}

impl SourceFs for MemFs {
    fn stat(&self, path: &Path) -> io::Result<FileMeta> {
        let real = self.resolve(path);
        let mut meta = self.meta_at(&real)?;
        meta.physical_path = Path::new("/mem").join(&real);
        Ok(meta)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<FileMeta>> {
        if self.fail_read_dir.contains(path) {
            return Err(io::Error::other("injected read_dir failure"));
        }
        let real = self.resolve(path);
        if !self.meta_at(&real)?.is_dir() {
            return Err(io::Error::new(io::ErrorKind::NotADirectory, path.display().to_string()));
        }
        self.nodes
            .keys()
            .filter(|key| !key.as_os_str().is_empty() && key.parent() == Some(real.as_path()))
            .map(|key| self.meta_at(key))
            .collect()
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        self.stat(path)?.open()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
