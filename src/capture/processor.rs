//! Concurrent page construction.
//!
//! ```text
//! traversal ──► items (bounded) ──► N workers ──► pages (bounded) ──► consumer ──► Sites
//!                                        │
//!                                        └──► ErrorSink
//! ```
//!
//! The traversal thread blocks when the item queue is full; workers block
//! when the page queue is full. The consumer is the only writer of `Sites`
//! and hands the collection back when it exits.

use std::fs::{self, File};
use std::io;
use std::panic;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{Receiver, SendError, Sender, bounded};

use super::bundle::{Bundle, WorkItem};
use crate::core::{
    CancelToken, CaptureError, ConstructionError, ErrorPolicy, ErrorSink, ProcessingStats,
};
use crate::debug;
use crate::page::{Page, PageFactory, PageResource, Sites, SourceSpec};
use crate::vfs::{ContentClass, FileMeta};

/// The collector's view of the processor.
pub trait ProcessorProvider {
    /// Start workers; returns the token the run can be cancelled through.
    fn start(&mut self, token: &CancelToken) -> CancelToken;

    /// Queue one item. Blocks while the queue is full.
    fn process(&mut self, item: WorkItem) -> Result<(), CaptureError>;

    /// Drain all queues and stop the workers.
    fn wait(&mut self) -> Result<(), CaptureError>;
}

#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    pub num_workers: usize,
    pub item_queue: usize,
    pub page_queue: usize,
    /// Replace existing pages instead of adding.
    pub partial_build: bool,
    pub on_error: ErrorPolicy,
}

impl ProcessorOptions {
    /// Three workers per multiplier, queues as deep as the pool.
    pub fn with_multiplier(multiplier: usize) -> Self {
        let num_workers = multiplier.max(1) * 3;
        Self {
            num_workers,
            item_queue: num_workers,
            page_queue: num_workers,
            partial_build: false,
            on_error: ErrorPolicy::default(),
        }
    }
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self::with_multiplier(1)
    }
}

struct Running {
    items_tx: Sender<WorkItem>,
    workers: Vec<JoinHandle<()>>,
    consumer: JoinHandle<Sites>,
    token: CancelToken,
    sink: Arc<ErrorSink>,
}

pub struct PagesProcessor {
    spec: Arc<SourceSpec>,
    factory: Arc<dyn PageFactory>,
    options: ProcessorOptions,
    stats: Arc<ProcessingStats>,
    sites: Option<Sites>,
    running: Option<Running>,
}

impl PagesProcessor {
    pub fn new(
        spec: Arc<SourceSpec>,
        factory: Arc<dyn PageFactory>,
        options: ProcessorOptions,
    ) -> Self {
        let sites = Sites::new(&spec);
        Self {
            spec,
            factory,
            options,
            stats: Arc::new(ProcessingStats::new()),
            sites: Some(sites),
            running: None,
        }
    }

    pub fn with_stats(mut self, stats: Arc<ProcessingStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Start from an existing page collection (partial rebuilds).
    pub fn with_sites(mut self, sites: Sites) -> Self {
        self.sites = Some(sites);
        self
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    pub fn into_sites(mut self) -> Option<Sites> {
        self.sites.take()
    }

    fn spawn_consumer(&mut self, pages_rx: Receiver<Page>) -> JoinHandle<Sites> {
        let mut sites = self.sites.take().unwrap_or_else(|| Sites::new(&self.spec));
        let partial = self.options.partial_build;

        thread::Builder::new()
            .name("capture-pages".into())
            .spawn(move || {
                for page in pages_rx {
                    if partial {
                        sites.replace_page(page);
                    } else {
                        sites.add_page(page);
                    }
                }
                sites
            })
            .expect("Failed to spawn page consumer thread")
    }
}

impl ProcessorProvider for PagesProcessor {
    fn start(&mut self, token: &CancelToken) -> CancelToken {
        assert!(self.running.is_none(), "processor already started");

        let token = token.child();
        let sink = Arc::new(ErrorSink::new(self.options.on_error, token.clone()));
        let (items_tx, items_rx) = bounded::<WorkItem>(self.options.item_queue.max(1));
        let (pages_tx, pages_rx) = bounded::<Page>(self.options.page_queue.max(1));

        let consumer = self.spawn_consumer(pages_rx);

        let worker = Arc::new(PageWorker {
            spec: Arc::clone(&self.spec),
            factory: Arc::clone(&self.factory),
            stats: Arc::clone(&self.stats),
            sink: Arc::clone(&sink),
            token: token.clone(),
        });
        let workers = (0..self.options.num_workers.max(1))
            .map(|i| {
                let worker = Arc::clone(&worker);
                let items_rx = items_rx.clone();
                let pages_tx = pages_tx.clone();
                thread::Builder::new()
                    .name(format!("capture-worker-{i}"))
                    .spawn(move || worker.run(&items_rx, &pages_tx))
                    .expect("Failed to spawn worker thread")
            })
            .collect();

        debug!(
            "capture";
            "started {} workers, on error: {}",
            self.options.num_workers.max(1),
            self.options.on_error.as_str()
        );
        self.running = Some(Running {
            items_tx,
            workers,
            consumer,
            token: token.clone(),
            sink,
        });
        token
    }

    fn process(&mut self, item: WorkItem) -> Result<(), CaptureError> {
        let Some(running) = &self.running else {
            panic!("processor used before start");
        };
        if running.token.is_cancelled() {
            return Err(CaptureError::Cancelled);
        }
        // Only fails when every worker is gone; wait() reports why
        if let Err(SendError(item)) = running.items_tx.send(item) {
            debug!("capture"; "no worker left to take {} item", item.kind());
        }
        Ok(())
    }

    fn wait(&mut self) -> Result<(), CaptureError> {
        let Some(running) = self.running.take() else {
            panic!("processor used before start");
        };
        let Running {
            items_tx,
            workers,
            consumer,
            token,
            sink,
        } = running;

        drop(items_tx);
        let mut worker_panic = None;
        for handle in workers {
            if let Err(payload) = handle.join() {
                worker_panic.get_or_insert(payload);
            }
        }

        // All page senders are gone with the workers
        let sites = consumer.join();
        if let Some(payload) = worker_panic {
            panic::resume_unwind(payload);
        }
        match sites {
            Ok(sites) => self.sites = Some(sites),
            Err(payload) => panic::resume_unwind(payload),
        }

        let errors = sink.take();
        if !errors.is_empty() {
            return Err(CaptureError::Construction(errors));
        }
        if token.is_cancelled() {
            return Err(CaptureError::Cancelled);
        }
        Ok(())
    }
}

/// Shared by all worker threads.
struct PageWorker {
    spec: Arc<SourceSpec>,
    factory: Arc<dyn PageFactory>,
    stats: Arc<ProcessingStats>,
    sink: Arc<ErrorSink>,
    token: CancelToken,
}

impl PageWorker {
    fn run(&self, items: &Receiver<WorkItem>, pages: &Sender<Page>) {
        for item in items {
            // Keep draining so the traversal thread never blocks forever
            if self.token.is_cancelled() {
                continue;
            }
            self.process(item, pages);
        }
    }

    fn process(&self, item: WorkItem, pages: &Sender<Page>) {
        match item {
            WorkItem::Bundles(bundles) => {
                for (_, bundle) in bundles {
                    if self.should_skip(&bundle.header) {
                        continue;
                    }
                    let result = self.new_page_from_bundle(bundle);
                    self.send(result, pages);
                }
            }
            WorkItem::File(meta) => {
                if self.should_skip(&meta) {
                    return;
                }
                match meta.classifier {
                    ContentClass::Content => {
                        let site = self.spec.site_for(&meta.lang);
                        let result = self.factory.new_page(&meta, site, None);
                        self.send(result, pages);
                    }
                    ContentClass::StaticFile => {
                        if let Err(e) = self.copy_file(&meta) {
                            self.fail(e);
                        }
                    }
                    other => panic!(
                        "invalid classifier {other} for single file `{}`",
                        meta.logical_path.display()
                    ),
                }
            }
        }
    }

    /// Items in disabled languages are dropped silently.
    fn should_skip(&self, meta: &FileMeta) -> bool {
        self.spec.is_disabled(&meta.lang)
    }

    fn new_page_from_bundle(&self, bundle: Bundle) -> Result<Page, ConstructionError> {
        let site = self.spec.site_for(&bundle.header.lang);
        let mut page = self.factory.new_page(&bundle.header, site, None)?;

        for meta in &bundle.resources {
            let resource = match meta.classifier {
                ContentClass::Content => {
                    let bundled = self.factory.new_page(meta, site, Some(&page))?;
                    PageResource::Page(Box::new(bundled))
                }
                ContentClass::StaticFile => {
                    PageResource::File(self.factory.new_resource(meta, site, &page)?)
                }
                other => panic!(
                    "invalid classifier {other} for resource `{}`",
                    meta.logical_path.display()
                ),
            };
            self.stats.resource();
            page.push_resource(resource);
        }
        Ok(page)
    }

    fn send(&self, result: Result<Page, ConstructionError>, pages: &Sender<Page>) {
        match result {
            Ok(page) => {
                self.stats.page();
                // The consumer only disappears by panicking; wait() re-raises it
                let _ = pages.send(page);
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail(&self, err: ConstructionError) {
        self.stats.error();
        self.sink.send(err);
    }

    /// Publish a plain file to `<output>/<lang base>/<logical path>`.
    fn copy_file(&self, meta: &FileMeta) -> Result<(), ConstructionError> {
        let site = self.spec.site_for(&meta.lang);
        let target = self.spec.publish_target(&site.code, &meta.logical_path);

        let mut reader = meta.open().map_err(|source| ConstructionError::Open {
            path: meta.logical_path.clone(),
            source,
        })?;
        let publish_err = |source: io::Error| ConstructionError::Publish {
            path: meta.logical_path.clone(),
            target: target.clone(),
            source,
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(publish_err)?;
        }
        let mut file = File::create(&target).map_err(publish_err)?;
        io::copy(&mut reader, &mut file).map_err(publish_err)?;

        self.stats.file();
        Ok(())
    }
}
