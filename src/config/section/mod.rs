//! Configuration section definitions.
//!
//! Each module corresponds to a section in `sitecap.toml`:
//!
//! | Module      | TOML Section   | Purpose                              |
//! |-------------|----------------|--------------------------------------|
//! | `build`     | `[build]`      | Output directory, workers, queues    |
//! | `content`   | `[content]`    | Content mounts and base path         |
//! | `languages` | `[languages]`  | Default and configured languages     |

mod build;
mod content;
mod languages;

pub use build::{BuildConfig, WORKER_MULTIPLIER_ENV};
pub use content::{ContentConfig, MountConfig};
pub use languages::{LanguageEntry, LanguagesConfig};
