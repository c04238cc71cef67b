//! Content capture: bundling walked files and building pages from them.

mod bundle;
mod collector;
mod processor;


pub use bundle::{Bundle, BundleSet, WorkItem};
pub use collector::Collector;
pub use processor::{PagesProcessor, ProcessorOptions, ProcessorProvider};
