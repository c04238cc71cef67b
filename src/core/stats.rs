//! Counters for one processing run.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use crate::logger::ProgressLine;

#[derive(Debug, Default)]
pub struct ProcessingStats {
    pages: AtomicUsize,
    resources: AtomicUsize,
    files: AtomicUsize,
    errors: AtomicUsize,
    progress: Option<Arc<ProgressLine>>,
}

/// Plain copy of the counters, e.g. for `--json` output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub pages: usize,
    pub resources: usize,
    pub files: usize,
    pub errors: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(progress: Arc<ProgressLine>) -> Self {
        Self {
            progress: Some(progress),
            ..Self::default()
        }
    }

    pub fn page(&self) {
        self.bump(&self.pages, "pages");
    }

    pub fn resource(&self) {
        self.bump(&self.resources, "resources");
    }

    pub fn file(&self) {
        self.bump(&self.files, "files");
    }

    pub fn error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn bump(&self, counter: &AtomicUsize, name: &str) {
        counter.fetch_add(1, Ordering::Relaxed);
        if let Some(progress) = &self.progress {
            progress.inc(name);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            pages: self.pages.load(Ordering::Relaxed),
            resources: self.resources.load(Ordering::Relaxed),
            files: self.files.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} pages, {} resources, {} files",
            self.pages, self.resources, self.files
        )?;
        if self.errors > 0 {
            write!(f, ", {} errors", self.errors)?;
        }
        Ok(())
    }
}
