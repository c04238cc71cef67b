//! OS-backed overlay of several content mounts.
//!
//! Directories with the same relative path are merged across mounts (the
//! first mount gives the directory its identity). Files are never merged:
//! two mounts providing `post.md` both show up in the listing, and the
//! collector decides which one wins.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use super::classify::{IGNORED_FILES, classify, split_lang};
use super::meta::FileMeta;
use super::source::SourceFs;
use crate::{debug, log};
use crate::utils::path::normalize_path;

/// One content root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub dir: PathBuf,
    /// Language of files without a language suffix. Empty: default language.
    pub lang: String,
    pub weight: i32,
}

impl Mount {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lang: String::new(),
            weight: 0,
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
}

#[derive(Debug, Clone)]
pub struct MountFs {
    mounts: Vec<Mount>,
    /// Configured language codes, used to recognize `name.<lang>.ext`.
    languages: Vec<String>,
    default_lang: String,
}

impl MountFs {
    pub fn new(mounts: Vec<Mount>, languages: Vec<String>, default_lang: impl Into<String>) -> Self {
        Self {
            mounts,
            languages,
            default_lang: default_lang.into(),
        }
    }

    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    /// Build the record for one physical entry.
    ///
    /// With `link_name`, a symlink keeps its own name in `name` and only
    /// `entry_name` reflects the target.
    fn entry_meta(
        &self,
        mount: &Mount,
        logical: &Path,
        physical: &Path,
        link_name: bool,
    ) -> io::Result<FileMeta> {
        let lmeta = fs::symlink_metadata(physical)?;
        let is_link = lmeta.file_type().is_symlink();
        let is_dir = if is_link {
            fs::metadata(physical)?.is_dir()
        } else {
            lmeta.is_dir()
        };

        let canonical = normalize_path(physical);
        let listed = file_name(physical);
        let entry_name = if is_link {
            file_name(&canonical)
        } else {
            listed.clone()
        };
        let name = if link_name { listed } else { entry_name.clone() };

        let (suffix_lang, base) = if is_dir {
            (None, name.clone())
        } else {
            split_lang(&name, &self.languages)
        };

        let mut meta = FileMeta::new(name, classify(&base, is_dir))
            .with_lang(suffix_lang.unwrap_or(&mount.lang))
            .with_weight(mount.weight);
        meta.entry_name = entry_name;
        meta.translation_base_name = base;
        meta.logical_path = logical.to_path_buf();
        meta.walk_path = logical.to_path_buf();
        meta.physical_path = canonical.clone();

        if !is_dir {
            meta = meta.with_open(Arc::new(move || {
                Ok(Box::new(File::open(&canonical)?) as Box<dyn Read + Send>)
            }));
        }
        Ok(meta)
    }

    fn stat_with(&self, path: &Path, link_name: bool) -> io::Result<FileMeta> {
        for mount in &self.mounts {
            let physical = mount.dir.join(path);
            match self.entry_meta(mount, path, &physical, link_name) {
                Ok(meta) => return Ok(meta),
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            }
        }
        Err(not_found(path))
    }

    fn resolved_lang<'a>(&'a self, meta: &'a FileMeta) -> &'a str {
        if meta.lang.is_empty() {
            &self.default_lang
        } else {
            &meta.lang
        }
    }

    /// Record which languages provide each translation base name.
    fn fill_translations(&self, entries: &mut [FileMeta]) {
        let mut by_base: FxHashMap<&str, Vec<String>> = FxHashMap::default();
        for meta in entries.iter().filter(|m| !m.is_dir()) {
            let langs = by_base.entry(&meta.translation_base_name).or_default();
            let lang = self.resolved_lang(meta);
            if !langs.iter().any(|l| l == lang) {
                langs.push(lang.to_owned());
            }
        }
        let by_base: FxHashMap<String, Vec<String>> = by_base
            .into_iter()
            .map(|(base, mut langs)| {
                langs.sort();
                (base.to_owned(), langs)
            })
            .collect();

        for meta in entries.iter_mut().filter(|m| !m.is_dir()) {
            if let Some(langs) = by_base.get(&meta.translation_base_name) {
                meta.translations = langs.clone();
            }
        }
    }
}

impl SourceFs for MountFs {
    fn stat(&self, path: &Path) -> io::Result<FileMeta> {
        self.stat_with(path, false)
    }

    fn lstat_if_possible(&self, path: &Path) -> io::Result<FileMeta> {
        self.stat_with(path, true)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<FileMeta>> {
        let mut entries = Vec::new();
        let mut dir_names = FxHashSet::default();
        let mut found = false;

        for mount in &self.mounts {
            let dir = mount.dir.join(path);
            let listing = match fs::read_dir(&dir) {
                Ok(listing) => listing,
                Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
                    continue;
                }
                Err(e) => return Err(e),
            };
            found = true;

            for entry in listing {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().into_owned();
                if IGNORED_FILES.contains(&name.as_str()) {
                    continue;
                }
                let meta = match self.entry_meta(mount, &path.join(&name), &entry.path(), true) {
                    Ok(meta) => meta,
                    Err(e) => {
                        report_skipped(&entry.path(), &e);
                        continue;
                    }
                };
                if meta.is_dir() && !dir_names.insert(meta.name.clone()) {
                    continue;
                }
                entries.push(meta);
            }
        }

        if !found {
            return Err(not_found(path));
        }
        self.fill_translations(&mut entries);
        Ok(entries)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        self.stat(path)?.open()
    }
}

/// Dangling symlinks are expected in content trees; anything else (e.g.
/// permission errors) is worth a warning.
fn is_quiet_skip(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

fn report_skipped(path: &Path, err: &io::Error) {
    if is_quiet_skip(err) {
        debug!("walk"; "skipping `{}`: {}", path.display(), err);
    } else {
        log!("warning"; "skipping unreadable `{}`: {}", path.display(), err);
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("`{}` not found in any mount", path.display()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::ContentClass;
    use tempfile::TempDir;

    fn langs() -> Vec<String> {
        vec!["en".into(), "fr".into()]
    }

    fn find<'a>(entries: &'a [FileMeta], name: &str) -> Vec<&'a FileMeta> {
        entries.iter().filter(|e| e.name == name).collect()
    }

    #[test]
    fn test_merges_directories_keeps_duplicate_files() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        fs::create_dir_all(a.path().join("posts")).unwrap();
        fs::create_dir_all(b.path().join("posts")).unwrap();
        fs::write(a.path().join("posts/hello.md"), "a").unwrap();
        fs::write(b.path().join("posts/hello.md"), "b").unwrap();
        fs::write(b.path().join("posts/extra.md"), "b").unwrap();

        let vfs = MountFs::new(
            vec![
                Mount::new(a.path()).with_weight(2),
                Mount::new(b.path()).with_weight(1),
            ],
            langs(),
            "en",
        );

        let root = vfs.read_dir(Path::new("")).unwrap();
        assert_eq!(find(&root, "posts").len(), 1);
        assert!(find(&root, "posts")[0].is_dir());

        let posts = vfs.read_dir(Path::new("posts")).unwrap();
        let hellos = find(&posts, "hello.md");
        assert_eq!(hellos.len(), 2);
        let mut weights: Vec<_> = hellos.iter().map(|m| m.weight).collect();
        weights.sort();
        assert_eq!(weights, [1, 2]);
        assert_eq!(find(&posts, "extra.md").len(), 1);
    }

    #[test]
    fn test_language_suffix_and_translations() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.md"), "en").unwrap();
        fs::write(dir.path().join("index.fr.md"), "fr").unwrap();
        fs::write(dir.path().join("cover.jpg"), "jpg").unwrap();

        let vfs = MountFs::new(vec![Mount::new(dir.path())], langs(), "en");
        let entries = vfs.read_dir(Path::new("")).unwrap();

        let fr = find(&entries, "index.fr.md")[0];
        assert_eq!(fr.lang, "fr");
        assert_eq!(fr.translation_base_name, "index.md");
        assert_eq!(fr.classifier, ContentClass::LeafBundleHeader);
        assert_eq!(fr.translations, ["en", "fr"]);

        let en = find(&entries, "index.md")[0];
        assert_eq!(en.lang, "");
        assert_eq!(en.translations, ["en", "fr"]);

        let cover = find(&entries, "cover.jpg")[0];
        assert_eq!(cover.classifier, ContentClass::StaticFile);
        assert_eq!(cover.translations, ["en"]);
    }

    #[test]
    fn test_mount_language_applies_without_suffix() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("post.md"), "x").unwrap();

        let vfs = MountFs::new(vec![Mount::new(dir.path()).with_lang("fr")], langs(), "en");
        let entries = vfs.read_dir(Path::new("")).unwrap();
        assert_eq!(entries[0].lang, "fr");
        assert_eq!(entries[0].translations, ["fr"]);
    }

    #[test]
    fn test_ignored_files_are_hidden() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".DS_Store"), "").unwrap();
        fs::write(dir.path().join("a.md"), "").unwrap();

        let vfs = MountFs::new(vec![Mount::new(dir.path())], langs(), "en");
        let entries = vfs.read_dir(Path::new("")).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_stat_and_open() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/a.md"), "hello").unwrap();

        let vfs = MountFs::new(vec![Mount::new(dir.path())], langs(), "en");
        assert!(vfs.stat(Path::new("sub")).unwrap().is_dir());
        assert!(vfs.lstat_if_possible(Path::new("")).unwrap().is_dir());

        let mut buf = String::new();
        vfs.open(Path::new("sub/a.md"))
            .unwrap()
            .read_to_string(&mut buf)
            .unwrap();
        assert_eq!(buf, "hello");

        let err = vfs.stat(Path::new("missing")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(vfs.read_dir(Path::new("missing")).is_err());
    }

    #[test]
    fn test_only_missing_entries_are_skipped_quietly() {
        assert!(is_quiet_skip(&io::Error::from(io::ErrorKind::NotFound)));
        assert!(!is_quiet_skip(&io::Error::from(io::ErrorKind::PermissionDenied)));
        assert!(!is_quiet_skip(&io::Error::other("io failure")));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_keeps_listed_name() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("target")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("target"), dir.path().join("alias")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("nowhere"), dir.path().join("broken")).unwrap();

        let vfs = MountFs::new(vec![Mount::new(dir.path())], langs(), "en");
        let entries = vfs.read_dir(Path::new("")).unwrap();

        let alias = find(&entries, "alias")[0];
        assert!(alias.is_dir());
        assert_eq!(alias.entry_name, "target");
        assert_eq!(alias.physical_path, find(&entries, "target")[0].physical_path);
        assert!(find(&entries, "broken").is_empty());
    }
}
