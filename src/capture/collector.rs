//! Turns a walked content tree into work items.
//!
//! For each directory the pre hook drops duplicate files (same language and
//! translation base name; the first one in walk order wins), then:
//!
//! - `_index.*` present: **branch bundle**. The directory's own files form
//!   one bundle set (content files go out individually) and the walk
//!   continues into subdirectories.
//! - `index.*` present: **leaf bundle**. A nested walk sweeps the whole
//!   subtree into one bundle set and the outer walk skips it.
//! - otherwise every file is a work item of its own.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use super::bundle::{Bundle, BundleSet, WorkItem};
use super::processor::ProcessorProvider;
use crate::core::{CancelToken, CaptureError};
use crate::debug;
use crate::page::SourceSpec;
use crate::vfs::{ContentClass, FileMeta, HookFlow, SourceFs, VisitFlow, WalkEvent, Walker};

pub struct Collector<'a, P: ProcessorProvider> {
    fs: &'a dyn SourceFs,
    spec: &'a SourceSpec,
    proc: &'a mut P,
    token: CancelToken,
    root: PathBuf,
    base_path: PathBuf,
}

impl<'a, P: ProcessorProvider> Collector<'a, P> {
    pub fn new(fs: &'a dyn SourceFs, spec: &'a SourceSpec, proc: &'a mut P) -> Self {
        Self {
            fs,
            spec,
            proc,
            token: CancelToken::new(),
            root: PathBuf::new(),
            base_path: PathBuf::new(),
        }
    }

    /// Directory to walk, relative to the filesystem root.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Prefix stripped from logical paths.
    pub fn base_path(mut self, base: impl Into<PathBuf>) -> Self {
        self.base_path = base.into();
        self
    }

    /// Parent cancellation context for the processor.
    pub fn token(mut self, token: CancelToken) -> Self {
        self.token = token;
        self
    }

    /// Start the processor, walk the tree, then wait for the processor.
    ///
    /// Returns the walk error if there was one, else the processor's.
    pub fn collect(&mut self) -> Result<(), CaptureError> {
        self.proc.start(&self.token);

        let fs = self.fs;
        let root = self.root.clone();
        let base_path = self.base_path.clone();
        let walk_result = Walker::new(fs, root)
            .base_path(base_path)
            .hook_pre(|dir, path, entries| self.pre_hook(dir, path, entries))
            .walk(fail_on_error);

        let wait_result = self.proc.wait();
        match (walk_result, wait_result) {
            // The walk only stopped because the errors below cancelled the run
            (Err(CaptureError::Cancelled), Err(err @ CaptureError::Construction(_))) => Err(err),
            (Err(err), _) => Err(err),
            (Ok(()), wait_result) => wait_result,
        }
    }

    fn pre_hook(&mut self, dir: &FileMeta, path: &Path, mut entries: Vec<FileMeta>) -> HookFlow {
        dedup_entries(self.spec, &mut entries);
        let has = |class| entries.iter().any(|e| e.classifier == class);
        let is_branch = has(ContentClass::BranchBundleHeader);
        let is_leaf = has(ContentClass::LeafBundleHeader);

        let result = if is_branch {
            self.handle_bundle_branch(&entries)
                .map(|()| HookFlow::Continue(entries))
        } else if is_leaf {
            self.handle_bundle_leaf(dir, path, entries)
                .map(|()| HookFlow::SkipSubtree)
        } else {
            self.handle_files(&entries)
                .map(|()| HookFlow::Continue(entries))
        };
        result.unwrap_or_else(HookFlow::Fail)
    }

    /// Bundle this directory's files; content files go out on their own.
    fn handle_bundle_branch(&mut self, entries: &[FileMeta]) -> Result<(), CaptureError> {
        let mut bundled = Vec::new();
        for meta in entries.iter().filter(|e| !e.is_dir()) {
            if meta.classifier == ContentClass::Content {
                self.proc.process(WorkItem::File(meta.clone()))?;
            } else {
                bundled.push(meta.clone());
            }
        }
        self.submit(assemble(self.spec, bundled))
    }

    /// Sweep the whole subtree into one bundle set.
    fn handle_bundle_leaf(
        &mut self,
        dir: &FileMeta,
        path: &Path,
        entries: Vec<FileMeta>,
    ) -> Result<(), CaptureError> {
        let spec = self.spec;
        let mut files = Vec::new();
        Walker::new(self.fs, path)
            .base_path(self.base_path.clone())
            .info(dir.clone())
            .entries(entries)
            .hook_pre(|_, _, mut entries| {
                dedup_entries(spec, &mut entries);
                HookFlow::Continue(entries)
            })
            .walk(|event| match event {
                WalkEvent::Node { meta, .. } => {
                    if !meta.is_dir() {
                        files.push(meta.clone());
                    }
                    VisitFlow::Continue
                }
                error => fail_on_error(error),
            })?;

        self.submit(assemble(self.spec, files))
    }

    fn handle_files(&mut self, entries: &[FileMeta]) -> Result<(), CaptureError> {
        for meta in entries.iter().filter(|e| !e.is_dir()) {
            self.proc.process(WorkItem::File(meta.clone()))?;
        }
        Ok(())
    }

    fn submit(&mut self, bundles: BundleSet) -> Result<(), CaptureError> {
        if bundles.is_empty() {
            return Ok(());
        }
        debug!(
            "capture";
            "bundle [{}]",
            bundles.langs().collect::<Vec<_>>().join(", ")
        );
        self.proc.process(WorkItem::Bundles(bundles))
    }
}

/// Drop files whose (language, translation base name) was already seen in
/// this listing. Mounts are merged, so duplicates arrive most important
/// first.
fn dedup_entries(spec: &SourceSpec, entries: &mut Vec<FileMeta>) {
    let mut seen = FxHashSet::default();
    entries.retain(|meta| {
        if meta.is_dir() {
            return true;
        }
        let key = (
            spec.resolve_lang(&meta.lang).to_owned(),
            meta.translation_base_name.clone(),
        );
        if seen.insert(key) {
            return true;
        }
        debug!("capture"; "dropping duplicate `{}` (weight {})", meta.walk_path.display(), meta.weight);
        false
    });
}

/// Abort the walk on the first traversal error.
fn fail_on_error(event: WalkEvent<'_>) -> VisitFlow {
    match event {
        WalkEvent::Error { error, .. } => VisitFlow::Fail(error.into()),
        WalkEvent::Node { .. } => VisitFlow::Continue,
    }
}

/// Group files into a bundle set, headers first, then give every enabled
/// language without a bundle a synthesized one.
pub(super) fn assemble(spec: &SourceSpec, files: Vec<FileMeta>) -> BundleSet {
    let mut bundles = BundleSet::new();
    let (headers, rest): (Vec<_>, Vec<_>) = files
        .into_iter()
        .partition(|f| f.classifier.is_bundle_header());

    for meta in headers.into_iter().chain(rest) {
        add_to_bundle(spec, meta, &mut bundles);
    }
    fill_missing_languages(spec, &mut bundles);
    bundles
}

/// Add one file to the bundle of its language.
///
/// A language seen for the first time through a non-header file gets a
/// header cloned from another language. Static files that lack a
/// translation in another bundle's language are cloned into that bundle.
pub(super) fn add_to_bundle(spec: &SourceSpec, meta: FileMeta, bundles: &mut BundleSet) {
    let lang = spec.resolve_lang(&meta.lang).to_owned();
    let is_header = meta.classifier.is_bundle_header();

    if !bundles.contains(&lang) {
        let bundle = if is_header {
            Bundle::new(meta.clone())
        } else {
            clone_bundle(spec, &lang, bundles)
        };
        bundles.insert(lang.clone(), bundle);
    }

    if meta.classifier == ContentClass::StaticFile && meta.translations.len() < bundles.len() {
        for (other, bundle) in bundles.iter_mut() {
            if *other != lang && !meta.has_translation(other) {
                bundle.resources.push(meta.clone_with_lang(other));
            }
        }
    }

    if !is_header && let Some(bundle) = bundles.get_mut(&lang) {
        bundle.resources.push(meta);
    }
}

/// Bundle to copy headers from: the default language, else the first.
fn source_bundle<'b>(spec: &SourceSpec, bundles: &'b BundleSet) -> Option<&'b Bundle> {
    bundles
        .get(&spec.default_lang)
        .or_else(|| bundles.iter().next().map(|(_, b)| b))
}

fn clone_bundle(spec: &SourceSpec, lang: &str, bundles: &BundleSet) -> Bundle {
    let Some(source) = source_bundle(spec, bundles) else {
        panic!("no bundle to clone a `{lang}` header from");
    };
    Bundle::new(source.header.clone_with_lang(lang))
}

/// Synthesize bundles for enabled languages that have none.
fn fill_missing_languages(spec: &SourceSpec, bundles: &mut BundleSet) {
    let missing: Vec<String> = spec
        .enabled_languages()
        .map(|l| l.code.clone())
        .filter(|code| !bundles.contains(code))
        .collect();

    for lang in missing {
        let Some(source) = source_bundle(spec, bundles) else {
            return;
        };
        let mut bundle = Bundle::new(source.header.clone_with_lang(&lang));
        bundle.resources = source
            .resources
            .iter()
            .filter(|r| r.classifier == ContentClass::StaticFile && !r.has_translation(&lang))
            .map(|r| r.clone_with_lang(&lang))
            .collect();

        debug!("capture"; "synthesized `{}` bundle for `{}`", lang, bundle.header.logical_path.display());
        bundles.insert(lang, bundle);
    }
}
