//! Global config handle.
//!
//! Uses `arc-swap` for lock-free reads. The capture commands install the
//! loaded config once and read it back through `cfg()`.

use crate::config::SiteConfig;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<SiteConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(SiteConfig::default()));

#[inline]
pub fn cfg() -> Arc<SiteConfig> {
    CONFIG.load_full()
}

#[inline]
pub fn init_config(config: SiteConfig) -> Arc<SiteConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
