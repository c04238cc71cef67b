//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! output = "public"           # Publish directory for plain files
//! worker_multiplier = 4       # Workers = 3 x multiplier (default: CPU count)
//! item_queue = 12             # Work item queue depth (default: worker count)
//! page_queue = 12             # Constructed page queue depth (default: worker count)
//! partial = false             # Replace pages instead of adding them
//! on_error = "continue"       # "continue" or "cancel"
//! ```
//!
//! `SITECAP_NUM_WORKER_MULTIPLIER` overrides `worker_multiplier`.

use std::env;
use std::path::{Path, PathBuf};
use std::thread;

use serde::{Deserialize, Serialize};

use crate::capture::ProcessorOptions;
use crate::config::{ConfigDiagnostics, FieldPath};
use crate::core::ErrorPolicy;
use crate::utils::path::resolve_under;

pub const WORKER_MULTIPLIER_ENV: &str = "SITECAP_NUM_WORKER_MULTIPLIER";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub output: PathBuf,
    pub worker_multiplier: Option<usize>,
    pub item_queue: Option<usize>,
    pub page_queue: Option<usize>,
    pub partial: bool,
    pub on_error: ErrorPolicy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: "public".into(),
            worker_multiplier: None,
            item_queue: None,
            page_queue: None,
            partial: false,
            on_error: ErrorPolicy::default(),
        }
    }
}

impl BuildConfig {
    const WORKER_MULTIPLIER: FieldPath = FieldPath::new("build.worker_multiplier");
    const ITEM_QUEUE: FieldPath = FieldPath::new("build.item_queue");
    const PAGE_QUEUE: FieldPath = FieldPath::new("build.page_queue");

    pub fn normalize(&mut self, root: &Path) {
        self.output = resolve_under(&self.output, root);
    }

    /// Environment first, then config, then available parallelism.
    pub fn effective_multiplier(&self) -> usize {
        env::var(WORKER_MULTIPLIER_ENV)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .filter(|&m: &usize| m > 0)
            .or(self.worker_multiplier)
            .unwrap_or_else(|| thread::available_parallelism().map_or(1, |n| n.get()))
    }

    pub fn processor_options(&self) -> ProcessorOptions {
        let mut options = ProcessorOptions::with_multiplier(self.effective_multiplier());
        if let Some(n) = self.item_queue {
            options.item_queue = n;
        }
        if let Some(n) = self.page_queue {
            options.page_queue = n;
        }
        options.partial_build = self.partial;
        options.on_error = self.on_error;
        options
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let checks = [
            (Self::WORKER_MULTIPLIER, self.worker_multiplier),
            (Self::ITEM_QUEUE, self.item_queue),
            (Self::PAGE_QUEUE, self.page_queue),
        ];
        for (field, value) in checks {
            if value == Some(0) {
                diag.error(field, "must be at least 1");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_build_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert_eq!(config.build.on_error, ErrorPolicy::Continue);
        assert!(!config.build.partial);
        assert!(config.build.worker_multiplier.is_none());
    }

    #[test]
    fn test_processor_options_from_config() {
        let config = test_parse_config(
            "[build]\nworker_multiplier = 2\npage_queue = 1\npartial = true\non_error = \"cancel\"",
        );
        let options = config.build.processor_options();
        // Environment may override the multiplier, queues follow whatever it is
        assert_eq!(options.item_queue, options.num_workers);
        assert_eq!(options.page_queue, 1);
        assert!(options.partial_build);
        assert_eq!(options.on_error, ErrorPolicy::Cancel);
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let config = test_parse_config("[build]\nworker_multiplier = 0\nitem_queue = 0");
        let mut diag = ConfigDiagnostics::new();
        config.build.validate(&mut diag);
        assert_eq!(diag.len(), 2);
    }

    #[test]
    fn test_unknown_policy_is_parse_error() {
        let result = crate::config::SiteConfig::from_str("[build]\non_error = \"retry\"");
        assert!(result.is_err());
    }
}
