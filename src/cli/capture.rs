//! `capture` command: walk the mounts, bundle, construct pages and publish
//! plain files.

use std::io::{IsTerminal, stdout};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::capture::{Collector, PagesProcessor};
use crate::cli::args::CaptureArgs;
use crate::config::SiteConfig;
use crate::core::{
    CancelToken, CaptureError, ConstructionError, ProcessingStats, StatsSnapshot, is_shutdown,
};
use crate::{debug, log};
use crate::logger::ProgressLine;
use crate::page::{ContentPageFactory, Page, PageKind, PageResource, Sites};
use crate::utils::hash::ContentHash;
use crate::vfs::MountFs;

pub fn capture_site(config: &SiteConfig, args: &CaptureArgs, token: CancelToken) -> Result<()> {
    if args.json {
        crate::logger::set_quiet(true);
    }

    let spec = Arc::new(config.source_spec());
    let fs = MountFs::new(
        config.mounts(),
        spec.language_codes(),
        spec.default_lang.clone(),
    );
    let root = args.common.root.clone().unwrap_or_default();

    let progress = (args.progress && !args.json && stdout().is_terminal())
        .then(|| Arc::new(ProgressLine::new("capture", &["pages", "resources", "files"])));
    let stats = Arc::new(match &progress {
        Some(progress) => ProcessingStats::with_progress(Arc::clone(progress)),
        None => ProcessingStats::new(),
    });

    let mut proc = PagesProcessor::new(
        Arc::clone(&spec),
        Arc::new(ContentPageFactory),
        config.processor_options(),
    )
    .with_stats(Arc::clone(&stats));

    log!(
        "walk";
        "walking `{}` across {} mounts",
        root.display(),
        fs.mounts().len()
    );
    for mount in fs.mounts() {
        debug!(
            "walk";
            "mount `{}` lang `{}` weight {}",
            config.root_relative(&mount.dir).display(),
            spec.resolve_lang(&mount.lang),
            mount.weight
        );
    }
    let result = Collector::new(&fs, &spec, &mut proc)
        .root(&root)
        .base_path(&config.content.base_path)
        .token(token)
        .collect();

    if let Some(progress) = &progress {
        progress.finish();
    }
    let sites = proc.into_sites().unwrap_or_default();
    let snapshot = stats.snapshot();

    if args.json {
        let errors = match &result {
            Err(CaptureError::Construction(errors)) => {
                errors.iter().map(ConstructionError::detail).collect()
            }
            _ => Vec::new(),
        };
        let summary = CaptureSummary::new(&sites, snapshot, errors);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_tree(&sites);
    }

    match result {
        Ok(()) => {
            log!("capture"; "done: {}", snapshot);
            Ok(())
        }
        Err(CaptureError::Cancelled) if is_shutdown() => bail!("capture interrupted after {snapshot}"),
        Err(CaptureError::Cancelled) => bail!("capture cancelled after {snapshot}"),
        Err(e) => Err(e.into()),
    }
}

/// Pages of one site, ordered by logical path.
fn sorted_pages(pages: &[Page]) -> Vec<&Page> {
    let mut pages: Vec<&Page> = pages.iter().collect();
    pages.sort_by(|a, b| a.logical_path().cmp(b.logical_path()));
    pages
}

fn print_tree(sites: &Sites) {
    for site in sites.iter().filter(|s| !s.is_empty()) {
        println!(
            "{} {}",
            site.lang.bold(),
            format!("({} pages)", site.len()).dimmed()
        );
        for page in sorted_pages(site.pages()) {
            let count = match page.resource_count() {
                0 => String::new(),
                n => format!("+{n}"),
            };
            let path = page.logical_path().display().to_string();
            let path = if page.kind.is_branch() {
                path.bold().to_string()
            } else {
                path
            };
            println!(
                "  {:<8} {} {} {}",
                page.kind.as_str().cyan(),
                path,
                page.content_hash.dimmed(),
                count.dimmed()
            );
            for bundled in page.bundled_pages() {
                println!("    {}", bundled.logical_path().display());
            }
            for file in page.files() {
                println!("    {}", file.meta.logical_path.display().dimmed());
            }
        }
    }
    println!("{} pages total", sites.total_pages());
}

// ============================================================================
// JSON summary
// ============================================================================

/// Serializable view of a finished run.
#[derive(Debug, Serialize)]
pub struct CaptureSummary<'a> {
    pub stats: StatsSnapshot,
    pub sites: Vec<SiteSummary<'a>>,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SiteSummary<'a> {
    pub lang: &'a str,
    pub pages: Vec<PageSummary<'a>>,
}

#[derive(Debug, Serialize)]
pub struct PageSummary<'a> {
    pub path: &'a Path,
    pub kind: PageKind,
    pub hash: ContentHash,
    pub len: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<&'a Path>,
    pub resources: Vec<ResourceSummary<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ResourceSummary<'a> {
    pub path: &'a Path,
    /// Path relative to the owning page's directory.
    pub target: Option<&'a Path>,
    pub page: bool,
}

impl<'a> CaptureSummary<'a> {
    pub fn new(sites: &'a Sites, stats: StatsSnapshot, errors: Vec<String>) -> Self {
        Self {
            stats,
            sites: sites
                .iter()
                .map(|site| SiteSummary {
                    lang: &site.lang,
                    pages: sorted_pages(site.pages())
                        .into_iter()
                        .map(PageSummary::new)
                        .collect(),
                })
                .collect(),
            errors,
        }
    }
}

impl<'a> PageSummary<'a> {
    fn new(page: &'a Page) -> Self {
        Self {
            path: page.logical_path(),
            kind: page.kind,
            hash: page.content_hash,
            len: page.content_len,
            owner: page.owner.as_deref(),
            resources: page.resources.iter().map(ResourceSummary::new).collect(),
        }
    }
}

impl<'a> ResourceSummary<'a> {
    fn new(resource: &'a PageResource) -> Self {
        let (target, page) = match resource {
            PageResource::Page(page) => (page.resource_path.as_deref(), true),
            PageResource::File(file) => (Some(file.target.as_path()), false),
        };
        Self {
            path: resource.logical_path(),
            target,
            page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use tempfile::TempDir;

    use crate::capture::ProcessorOptions;
    use crate::cli::CommonArgs;
    use crate::config::MountConfig;
    use crate::page::{Language, SourceSpec};
    use crate::vfs::testfs::MemFs;

    fn args() -> CaptureArgs {
        CaptureArgs {
            common: CommonArgs::default(),
            fail_fast: false,
            partial: false,
            json: false,
            progress: false,
        }
    }

    #[test]
    fn test_summary_lists_pages_and_resources() {
        let fs = MemFs::new()
            .file("posts/a/index.md", "# A")
            .file("posts/a/cover.jpg", "jpg")
            .file("posts/a/notes/extra.md", "x")
            .file("about.md", "about");
        let spec = SourceSpec::new("en", "/out").with_language(Language::new("fr"));

        let mut proc = PagesProcessor::new(
            Arc::new(spec.clone()),
            Arc::new(ContentPageFactory),
            ProcessorOptions::default(),
        );
        Collector::new(&fs, &spec, &mut proc).collect().unwrap();
        let stats = proc.stats().snapshot();
        let sites = proc.into_sites().unwrap();

        let summary = CaptureSummary::new(&sites, stats, Vec::new());
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["stats"]["pages"], 3);
        let en = &json["sites"][0];
        assert_eq!(en["lang"], "en");
        assert_eq!(en["pages"][0]["path"], "about.md");
        assert_eq!(en["pages"][0]["kind"], "page");

        let bundle = &en["pages"][1];
        assert_eq!(bundle["path"], "posts/a/index.md");
        assert_eq!(bundle["len"], 3);
        assert_eq!(bundle["hash"], ContentHash::new(*blake3::hash(b"# A").as_bytes()).to_hex());

        let targets: Vec<_> = bundle["resources"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| (r["target"].as_str().unwrap(), r["page"].as_bool().unwrap()))
            .collect();
        assert!(targets.contains(&("cover.jpg", false)));
        assert!(targets.contains(&("notes/extra.md", true)));

        // The synthesized fr bundle carries the cloned cover
        let fr = &json["sites"][1];
        assert_eq!(fr["lang"], "fr");
        assert_eq!(fr["pages"][0]["resources"][0]["path"], "posts/a/cover.jpg");
    }

    #[test]
    fn test_capture_site_publishes_files() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(content.join("posts/a")).unwrap();
        fs::write(content.join("posts/a/index.md"), "# A").unwrap();
        fs::write(content.join("robots.txt"), "User-agent: *").unwrap();

        let mut config = SiteConfig::default();
        config.content.mounts = vec![MountConfig::new(&content)];
        config.build.output = dir.path().join("public");

        capture_site(&config, &args(), CancelToken::new()).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("public/robots.txt")).unwrap(),
            "User-agent: *"
        );
    }

    #[test]
    fn test_capture_site_reports_cancellation() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("content")).unwrap();
        fs::write(dir.path().join("content/a.md"), "a").unwrap();

        let mut config = SiteConfig::default();
        config.content.mounts = vec![MountConfig::new(dir.path().join("content"))];
        config.build.output = dir.path().join("public");

        let token = CancelToken::new();
        token.cancel();
        let err = capture_site(&config, &args(), token).unwrap_err();
        assert!(err.to_string().contains("cancelled"));
    }
}
