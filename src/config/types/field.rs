//! Config field path used in diagnostics.

use owo_colors::OwoColorize;
use std::fmt;

/// Dotted path of a config field, e.g. `content.mounts.lang`.
///
/// Sections declare theirs as associated constants:
///
/// ```ignore
/// const DEFAULT: FieldPath = FieldPath::new("languages.default");
/// diag.error(Self::DEFAULT, "must not be empty");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(pub &'static str);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_args!("`{}`", self.0).bright_blue())
    }
}
