//! Error taxonomy for the capture pipeline.
//!
//! | Type                | Raised by             | Policy                                   |
//! |---------------------|-----------------------|------------------------------------------|
//! | `TraversalError`    | walker (stat/list)    | delivered to the visit callback, aborts  |
//! | `ConstructionError` | processor workers     | collected in the error sink, non-fatal   |
//! | `CaptureError`      | collector / processor | what `collect()` and `wait()` return     |
//!
//! Broken internal contracts (missing entry names, resources with a header
//! classifier, ...) are not represented here: they panic.

use std::fmt;
use std::io;
use std::path::PathBuf;

use owo_colors::OwoColorize;
use thiserror::Error;

/// Stat, open or list failure on a specific path.
#[derive(Debug, Error)]
pub enum TraversalError {
    #[error("walk: stat `{}`", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("walk: `{}` is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("walk: read directory `{}`", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TraversalError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Stat { path, .. } | Self::NotADirectory { path } | Self::ReadDir { path, .. } => {
                path
            }
        }
    }
}

/// Failure while building a page or resource, or publishing a plain file.
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error("failed to open `{}`", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to publish `{}` to `{}`", path.display(), target.display())]
    Publish {
        path: PathBuf,
        target: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ConstructionError {
    /// Source file the error is about.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Open { path, .. } | Self::Read { path, .. } | Self::Publish { path, .. } => path,
        }
    }

    /// Message with the io cause appended, for one-line logging.
    pub fn detail(&self) -> String {
        use std::error::Error as _;
        match self.source() {
            Some(cause) => format!("{self}: {cause}"),
            None => self.to_string(),
        }
    }
}

/// All construction errors of one run, in arrival order.
#[derive(Debug, Default)]
pub struct ConstructionErrors(Vec<ConstructionError>);

impl ConstructionErrors {
    pub fn new(errors: Vec<ConstructionError>) -> Self {
        Self(errors)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstructionError> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<ConstructionError> {
        self.0
    }
}

impl fmt::Display for ConstructionErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", "page construction failed:".red().bold())?;
        for err in &self.0 {
            write!(f, "\n{} {}", "→".red(), err.detail())?;
        }
        if self.0.len() > 1 {
            write!(
                f,
                "\n\n{} {} {}",
                "found".dimmed(),
                self.0.len().to_string().red().bold(),
                "errors".dimmed()
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for ConstructionErrors {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.first().map(|e| e as _)
    }
}

/// Error returned by `Collector::collect` and `Processor::wait`.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error(transparent)]
    Traversal(#[from] TraversalError),

    // NOTE: No #[from] here - construction errors only surface as a batch
    #[error("{0}")]
    Construction(ConstructionErrors),

    #[error("capture cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_traversal_error_display() {
        let err = TraversalError::Stat {
            path: PathBuf::from("content/posts"),
            source: Error::new(ErrorKind::NotFound, "gone"),
        };
        let display = format!("{err}");
        assert!(display.contains("stat"));
        assert!(display.contains("content/posts"));
        assert_eq!(err.path(), std::path::Path::new("content/posts"));
    }

    #[test]
    fn test_construction_error_detail_includes_cause() {
        let err = ConstructionError::Open {
            path: PathBuf::from("posts/a/index.md"),
            source: Error::new(ErrorKind::PermissionDenied, "denied"),
        };
        let detail = err.detail();
        assert!(detail.contains("posts/a/index.md"));
        assert!(detail.contains("denied"));
    }

    #[test]
    fn test_construction_errors_display_counts() {
        let errors = ConstructionErrors::new(vec![
            ConstructionError::Read {
                path: PathBuf::from("a.md"),
                source: Error::other("boom"),
            },
            ConstructionError::Read {
                path: PathBuf::from("b.md"),
                source: Error::other("boom"),
            },
        ]);
        let display = format!("{}", CaptureError::Construction(errors));
        assert!(display.contains("a.md"));
        assert!(display.contains("b.md"));
        assert!(display.contains('2'));
    }

    #[test]
    fn test_traversal_converts_into_capture_error() {
        let err: CaptureError = TraversalError::NotADirectory {
            path: PathBuf::from("index.md"),
        }
        .into();
        assert!(matches!(err, CaptureError::Traversal(_)));
        assert!(err.to_string().contains("not a directory"));
    }
}
