//! `walk` command: print the deterministic walk order.
//!
//! Directories already visited through another path (symlink cycles) are
//! listed right below their parent and marked, but not entered.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use owo_colors::OwoColorize;

use crate::cli::args::WalkArgs;
use crate::config::SiteConfig;
use crate::{debug, log};
use crate::vfs::{ContentClass, FileMeta, HookFlow, MountFs, SourceFs, VisitFlow, WalkEvent, Walker};

/// One printed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkLine {
    pub path: PathBuf,
    pub depth: usize,
    pub classifier: ContentClass,
    pub lang: String,
    pub weight: i32,
    /// Already visited; not entered.
    pub skipped: bool,
}

impl WalkLine {
    fn new(root: &Path, path: &Path, meta: &FileMeta) -> Self {
        let depth = path
            .strip_prefix(root)
            .map_or(0, |rel| rel.components().count());
        Self {
            path: path.to_path_buf(),
            depth,
            classifier: meta.classifier,
            lang: meta.lang.clone(),
            weight: meta.weight,
            skipped: meta.skip,
        }
    }
}

pub fn walk_site(config: &SiteConfig, args: &WalkArgs) -> Result<()> {
    let spec = config.source_spec();
    let fs = MountFs::new(config.mounts(), spec.language_codes(), spec.default_lang.clone());
    let root = args.common.root.clone().unwrap_or_default();

    let (lines, errors) = collect_walk(&fs, root)?;
    for line in &lines {
        print_line(line);
    }

    if errors > 0 {
        bail!("walk finished with {errors} errors");
    }
    log!("walk"; "{} entries", lines.len());
    Ok(())
}

/// Walk `root`, recording every visited node and every cycle-skipped
/// directory. Traversal errors are logged and counted.
pub fn collect_walk(fs: &dyn SourceFs, root: PathBuf) -> Result<(Vec<WalkLine>, usize)> {
    let lines = RefCell::new(Vec::new());
    let mut errors = 0;

    Walker::new(fs, root.clone())
        .hook_pre(|_, _, entries| {
            let mut lines = lines.borrow_mut();
            for meta in entries.iter().filter(|e| e.skip) {
                lines.push(WalkLine::new(&root, &meta.walk_path, meta));
            }
            HookFlow::Continue(entries)
        })
        .walk(|event| {
            match &event {
                WalkEvent::Node { path, meta } => {
                    lines.borrow_mut().push(WalkLine::new(&root, path, meta));
                }
                WalkEvent::Error { error, .. } => {
                    errors += 1;
                    debug!("walk"; "failed at `{}`", event.path().display());
                    log!("error"; "{}", error);
                }
            }
            VisitFlow::Continue
        })?;

    Ok((lines.into_inner(), errors))
}

fn print_line(line: &WalkLine) {
    let indent = "  ".repeat(line.depth);
    let name = line
        .path
        .file_name()
        .map_or_else(|| line.path.display().to_string(), |n| n.to_string_lossy().into_owned());

    if line.classifier == ContentClass::Directory {
        let marker = if line.skipped { " (already visited)" } else { "" };
        println!("{indent}{}/{}", name.bold(), marker.yellow());
        return;
    }

    let lang = if line.lang.is_empty() { "-" } else { line.lang.as_str() };
    println!(
        "{indent}{name}  {} {} {}",
        line.classifier.name().cyan(),
        lang.dimmed(),
        format!("w={}", line.weight).dimmed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::testfs::MemFs;

    fn paths(lines: &[WalkLine]) -> Vec<String> {
        lines.iter().map(|l| l.path.display().to_string()).collect()
    }

    #[test]
    fn test_walk_order_with_depth() {
        let fs = MemFs::new()
            .file("blog/post.md", "")
            .file("blog/_index.md", "")
            .file("about.fr.md", "");

        let (lines, errors) = collect_walk(&fs, PathBuf::new()).unwrap();
        assert_eq!(errors, 0);
        assert_eq!(paths(&lines), ["", "about.fr.md", "blog", "blog/_index.md", "blog/post.md"]);
        assert_eq!(lines[3].depth, 2);
        assert_eq!(lines[3].classifier, ContentClass::BranchBundleHeader);
        assert_eq!(lines[1].lang, "fr");
    }

    #[test]
    fn test_cycle_is_listed_as_skipped() {
        let fs = MemFs::new().file("a/x.md", "").link("a/loop", "a");

        let (lines, _) = collect_walk(&fs, PathBuf::new()).unwrap();
        let skipped: Vec<_> = lines.iter().filter(|l| l.skipped).collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].path, PathBuf::from("a/loop"));
        assert_eq!(lines.iter().filter(|l| l.path.ends_with("x.md")).count(), 1);
    }

    #[test]
    fn test_errors_are_counted() {
        let fs = MemFs::new().file("ok/a.md", "").dir("broken").fail_read_dir("broken");

        let (lines, errors) = collect_walk(&fs, PathBuf::new()).unwrap();
        assert_eq!(errors, 1);
        assert!(paths(&lines).contains(&"ok/a.md".to_string()));
    }
}
