//! Shared destination for per-item construction errors.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::cancel::CancelToken;
use super::error::{ConstructionError, ConstructionErrors};

/// What the processor does after the first construction error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Keep going, report every error from `wait()`.
    #[default]
    Continue,
    /// Cancel the run on the first error.
    Cancel,
}

impl ErrorPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Cancel => "cancel",
        }
    }
}

/// Collects errors from worker threads. Safe to call from any thread.
#[derive(Debug)]
pub struct ErrorSink {
    errors: Mutex<Vec<ConstructionError>>,
    policy: ErrorPolicy,
    token: CancelToken,
}

impl ErrorSink {
    pub fn new(policy: ErrorPolicy, token: CancelToken) -> Self {
        Self {
            errors: Mutex::new(Vec::new()),
            policy,
            token,
        }
    }

    pub fn send(&self, err: ConstructionError) {
        crate::log!("error"; "{}", err.detail());
        if self.policy == ErrorPolicy::Cancel {
            crate::debug!("capture"; "cancelling run after `{}`", err.path().display());
            self.token.cancel();
        }
        self.errors.lock().push(err);
    }

    pub fn len(&self) -> usize {
        self.errors.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain everything collected so far.
    pub fn take(&self) -> ConstructionErrors {
        ConstructionErrors::new(std::mem::take(&mut *self.errors.lock()))
    }
}
