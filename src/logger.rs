//! Logging utilities with colored output and progress display.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `ProgressLine` for a single-line display of running counters
//!
//! # Example
//!
//! ```ignore
//! log!("capture"; "walking {} mounts", count);
//!
//! let progress = ProgressLine::new("capture", &["pages", "resources", "files"]);
//! progress.inc("pages");
//! progress.finish();
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Global quiet flag, suppresses `log!` output (e.g. under `--json`)
static QUIET: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

pub fn set_quiet(q: bool) {
    QUIET.store(q, Ordering::SeqCst);
}

/// Active progress bar count (for log coordination)
static BAR_COUNT: AtomicUsize = AtomicUsize::new(0);

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
///
/// Goes to stderr so stdout stays clean for `--json` and tree output.
#[inline]
pub fn log(module: &str, message: &str) {
    if QUIET.load(Ordering::Relaxed) {
        return;
    }
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut out = std::io::stderr().lock();

    let bar_count = BAR_COUNT.load(Ordering::SeqCst);
    if bar_count > 0 {
        execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    }

    writeln!(out, "{prefix} {message}").ok();
    out.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "walk" => prefix.bright_blue().bold().to_string(),
        "capture" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Progress Line (single-line counters)
// ============================================================================

/// Single-line progress display with multiple open-ended counters
///
/// Displays: `[capture] pages(42) resources(5) files(120)`
///
/// Totals are unknown while the walk is still discovering work, so only
/// running counts are shown. Uses `try_lock` to avoid blocking worker
/// threads - if display is busy, the update is skipped
#[derive(Debug)]
pub struct ProgressLine {
    module: &'static str,
    counters: Vec<Counter>,
    lock: Mutex<()>,
    finished: AtomicBool,
}

#[derive(Debug)]
struct Counter {
    name: &'static str,
    current: AtomicUsize,
}

impl ProgressLine {
    pub fn new(module: &'static str, names: &[&'static str]) -> Self {
        let counters = names
            .iter()
            .map(|name| Counter {
                name,
                current: AtomicUsize::new(0),
            })
            .collect();

        BAR_COUNT.store(1, Ordering::SeqCst);

        let progress = Self {
            module,
            counters,
            lock: Mutex::new(()),
            finished: AtomicBool::new(false),
        };
        progress.display(false);
        progress
    }

    /// Increment the counter with the given name.
    ///
    /// Non-blocking: if display lock is held, skips refresh.
    #[inline]
    pub fn inc(&self, name: &str) {
        let Some(counter) = self.counters.iter().find(|c| c.name == name) else {
            return;
        };
        counter.current.fetch_add(1, Ordering::Relaxed);
        if let Some(_guard) = self.lock.try_lock() {
            self.display(false);
        }
    }

    pub fn get(&self, name: &str) -> usize {
        self.counters
            .iter()
            .find(|c| c.name == name)
            .map_or(0, |c| c.current.load(Ordering::Relaxed))
    }

    fn line(&self) -> String {
        self.counters
            .iter()
            .map(|c| format!("{}({})", c.name, c.current.load(Ordering::Relaxed)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn display(&self, newline: bool) {
        if QUIET.load(Ordering::Relaxed) || self.finished.load(Ordering::Relaxed) {
            return;
        }
        let prefix = colorize_prefix(self.module, self.module);
        let line = self.line();

        let mut out = std::io::stderr().lock();
        execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        if newline {
            writeln!(out, "{prefix} {line}").ok();
        } else {
            write!(out, "{prefix} {line}").ok();
        }
        out.flush().ok();
    }

    /// Finish progress display, preserve line and move to next line.
    ///
    /// Takes `&self` because the line is shared with worker threads.
    pub fn finish(&self) {
        let _guard = self.lock.lock();
        if self.finished.load(Ordering::SeqCst) {
            return;
        }
        self.display(true);
        self.finished.store(true, Ordering::SeqCst);
        BAR_COUNT.store(0, Ordering::SeqCst);
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        if self.finished.load(Ordering::SeqCst) {
            return;
        }
        BAR_COUNT.store(0, Ordering::SeqCst);

        // Clear the line on drop (if not finished properly)
        let mut out = std::io::stderr().lock();
        execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        out.flush().ok();
    }
}

// ============================================================================
// Tests
// ============================================================================
