//! Core types shared by traversal, collection and processing.

mod cancel;
mod error;
mod sink;
mod state;
mod stats;

pub use cancel::CancelToken;
pub use error::{CaptureError, ConstructionError, ConstructionErrors, TraversalError};
pub use sink::{ErrorPolicy, ErrorSink};
pub use state::{is_shutdown, root_token, setup_shutdown_handler};
pub use stats::{ProcessingStats, StatsSnapshot};
