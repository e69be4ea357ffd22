//! Type-safe config field path.

use owo_colors::OwoColorize;
use std::fmt;

/// A config field path such as `build.gradle.task`.
///
/// Sections declare their fields as associated constants so diagnostics
/// name the exact key a user has to fix.
///
/// # Example
///
/// ```ignore
/// impl GradleConfig {
///     pub const TASK: FieldPath = FieldPath::new("build.gradle.task");
/// }
///
/// return Err(RecompilerError::MissingProperty(GradleConfig::TASK));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldPath(&'static str);

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

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        self.0
    }
}
