//! Constructed pages, the page factory and the per-language page collection.

mod factory;
mod kind;
mod model;
mod site;

pub use factory::{ContentPageFactory, PageFactory};
pub use kind::PageKind;
pub use model::{Page, PageResource, Resource};
pub use site::{Language, Site, Sites, SourceSpec};
