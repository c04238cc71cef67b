//! Recursive, cycle-safe directory walker.
//!
//! # Traversal
//!
//! Depth-first, pre-order. For every directory:
//!
//! 1. `visit` sees the directory itself
//! 2. entries are listed (unless supplied) and sorted with [`compare_entries`]
//!    (unless the directory record says the listing is already ordered)
//! 3. each entry is stamped with its walk path and logical path; entries
//!    whose physical identity was already seen are marked `skip`
//! 4. the pre hook may replace the entries or skip the whole directory
//! 5. non-skipped entries are walked in order
//! 6. the post hook runs
//!
//! Visited identities live in a [`WalkContext`] created per `walk()` call.
//! A `Walker` can only be walked once.
//!
//! [`compare_entries`]: super::meta::compare_entries

use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use super::meta::{FileMeta, sort_entries};
use super::source::SourceFs;
use crate::core::{CaptureError, TraversalError};
use crate::debug;

/// What the visit callback sees.
#[derive(Debug)]
pub enum WalkEvent<'e> {
    Node {
        path: &'e Path,
        meta: &'e FileMeta,
    },
    /// Stat or listing failed. `meta` is `None` when the root itself could
    /// not be statted.
    Error {
        path: &'e Path,
        meta: Option<&'e FileMeta>,
        error: TraversalError,
    },
}

impl WalkEvent<'_> {
    pub fn path(&self) -> &Path {
        match self {
            Self::Node { path, .. } | Self::Error { path, .. } => path,
        }
    }
}

/// Result of the visit callback.
#[derive(Debug)]
pub enum VisitFlow {
    Continue,
    /// On a directory: do not enter it. On a file: skip the remaining
    /// entries of its directory.
    SkipSubtree,
    Fail(CaptureError),
}

/// Result of a pre or post hook.
#[derive(Debug)]
pub enum HookFlow {
    /// Walk on with these (possibly replaced) entries.
    Continue(Vec<FileMeta>),
    /// The hook handled the directory; do not descend.
    SkipSubtree,
    Fail(CaptureError),
}

pub type WalkHook<'a> = Box<dyn FnMut(&FileMeta, &Path, Vec<FileMeta>) -> HookFlow + 'a>;

/// Outcome of walking one node, as seen by its parent.
enum Step {
    Continue,
    /// A file asked to skip the rest of its directory.
    SkipSiblings,
}

/// Per-walk traversal state.
struct WalkContext<'v> {
    seen: FxHashSet<PathBuf>,
    visit: &'v mut dyn FnMut(WalkEvent<'_>) -> VisitFlow,
}

impl WalkContext<'_> {
    /// Record `identity`, returning true if it was already recorded.
    fn is_seen(&mut self, identity: Option<&Path>) -> bool {
        match identity {
            Some(id) => !self.seen.insert(id.to_path_buf()),
            None => false,
        }
    }

    /// Hand an error to the visitor; only `Fail` aborts.
    fn report(
        &mut self,
        path: &Path,
        meta: Option<&FileMeta>,
        error: TraversalError,
    ) -> Result<(), CaptureError> {
        match (self.visit)(WalkEvent::Error { path, meta, error }) {
            VisitFlow::Fail(e) => Err(e),
            VisitFlow::Continue | VisitFlow::SkipSubtree => Ok(()),
        }
    }
}

pub struct Walker<'a> {
    fs: &'a dyn SourceFs,
    root: PathBuf,
    base_path: PathBuf,
    info: Option<FileMeta>,
    entries: Option<Vec<FileMeta>>,
    hook_pre: Option<WalkHook<'a>>,
    hook_post: Option<WalkHook<'a>>,
    walked: bool,
}

impl<'a> Walker<'a> {
    pub fn new(fs: &'a dyn SourceFs, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
            base_path: PathBuf::new(),
            info: None,
            entries: None,
            hook_pre: None,
            hook_post: None,
            walked: false,
        }
    }

    /// Prefix stripped from logical paths.
    pub fn base_path(mut self, base: impl Into<PathBuf>) -> Self {
        self.base_path = base.into();
        self
    }

    /// Use this record for the root instead of statting it.
    pub fn info(mut self, info: FileMeta) -> Self {
        self.info = Some(info);
        self
    }

    /// Use these root entries instead of listing the root. Not re-sorted.
    pub fn entries(mut self, entries: Vec<FileMeta>) -> Self {
        self.entries = Some(entries);
        self
    }

    pub fn hook_pre(
        mut self,
        hook: impl FnMut(&FileMeta, &Path, Vec<FileMeta>) -> HookFlow + 'a,
    ) -> Self {
        self.hook_pre = Some(Box::new(hook));
        self
    }

    pub fn hook_post(
        mut self,
        hook: impl FnMut(&FileMeta, &Path, Vec<FileMeta>) -> HookFlow + 'a,
    ) -> Self {
        self.hook_post = Some(Box::new(hook));
        self
    }

    /// Walk the tree. Traversal errors go to `visit`; whatever `visit`
    /// (or a hook) fails with is returned.
    ///
    /// # Panics
    ///
    /// On a second call, or when the filesystem yields an entry without a name.
    pub fn walk<F>(&mut self, mut visit: F) -> Result<(), CaptureError>
    where
        F: FnMut(WalkEvent<'_>) -> VisitFlow,
    {
        assert!(
            !self.walked,
            "walker for `{}` is already walked",
            self.root.display()
        );
        self.walked = true;

        let mut ctx = WalkContext {
            seen: FxHashSet::default(),
            visit: &mut visit,
        };
        let root = self.root.clone();

        let info = match self.info.take() {
            Some(info) => info,
            None => match self.fs.lstat_if_possible(&root) {
                Ok(info) => info,
                Err(source) => {
                    let error = TraversalError::Stat {
                        path: root.clone(),
                        source,
                    };
                    return ctx.report(&root, None, error);
                }
            },
        };
        if !info.is_dir() {
            let error = TraversalError::NotADirectory { path: root.clone() };
            return ctx.report(&root, Some(&info), error);
        }

        let entries = self.entries.take();
        self.walk_node(&mut ctx, &root, &info, entries)?;
        Ok(())
    }

    fn logical_path(&self, walk_path: &Path) -> PathBuf {
        walk_path
            .strip_prefix(&self.base_path)
            .unwrap_or(walk_path)
            .to_path_buf()
    }

    fn walk_node(
        &mut self,
        ctx: &mut WalkContext<'_>,
        path: &Path,
        info: &FileMeta,
        entries: Option<Vec<FileMeta>>,
    ) -> Result<Step, CaptureError> {
        match (ctx.visit)(WalkEvent::Node { path, meta: info }) {
            VisitFlow::Continue => {}
            VisitFlow::SkipSubtree if info.is_dir() => return Ok(Step::Continue),
            VisitFlow::SkipSubtree => return Ok(Step::SkipSiblings),
            VisitFlow::Fail(e) => return Err(e),
        }
        if !info.is_dir() {
            return Ok(Step::Continue);
        }

        ctx.is_seen(info.identity());

        let mut entries = match entries {
            Some(entries) => entries,
            None => match self.fs.read_dir(path) {
                Ok(mut listed) => {
                    if !info.ordered {
                        sort_entries(&mut listed);
                    }
                    listed
                }
                Err(source) => {
                    let error = TraversalError::ReadDir {
                        path: path.to_path_buf(),
                        source,
                    };
                    ctx.report(path, Some(info), error)?;
                    return Ok(Step::Continue);
                }
            },
        };

        for meta in &mut entries {
            assert!(
                !meta.display_name().is_empty(),
                "[{}] no name set in {:?}",
                path.display(),
                meta
            );
            let walk_path = path.join(meta.display_name());
            meta.logical_path = self.logical_path(&walk_path);
            meta.walk_path = walk_path;

            if meta.is_dir() && ctx.is_seen(meta.identity()) {
                debug!("walk"; "already visited `{}`, skipping", meta.walk_path.display());
                meta.skip = true;
            }
        }

        if let Some(hook) = self.hook_pre.as_mut() {
            match hook(info, path, entries) {
                HookFlow::Continue(replaced) => entries = replaced,
                HookFlow::SkipSubtree => return Ok(Step::Continue),
                HookFlow::Fail(e) => return Err(e),
            }
        }

        for child in entries.iter().filter(|e| !e.skip) {
            match self.walk_node(ctx, &child.walk_path, child, None)? {
                Step::Continue => {}
                // The rest of this directory and its post hook are skipped
                Step::SkipSiblings => return Ok(Step::Continue),
            }
        }

        if let Some(hook) = self.hook_post.as_mut()
            && let HookFlow::Fail(e) = hook(info, path, entries)
        {
            return Err(e);
        }
        Ok(Step::Continue)
    }
}
