//! Virtual filesystem layer: metadata records, the overlay filesystem and
//! the walker.

mod classify;
mod meta;
mod mount;
mod source;
mod walk;

#[cfg(test)]
pub(crate) mod testfs;

pub use classify::{CONTENT_EXTENSIONS, classify, split_lang};
pub use meta::{ContentClass, FileMeta, OpenContent, compare_entries, sort_entries};
pub use mount::{Mount, MountFs};
pub use source::SourceFs;
pub use walk::{HookFlow, VisitFlow, WalkEvent, WalkHook, Walker};
