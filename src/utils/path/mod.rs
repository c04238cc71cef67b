//! Path utilities.

pub mod fs;

pub use fs::{normalize_path, resolve_under, strip_dir};
