//! Diagnostic severity levels ordered from least to most severe.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity level of a diagnostic message.
///
/// Ordered from least severe (`Help`) to most severe (`Error`) by declaration order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// A helpful suggestion that doesn't indicate a problem.
    Help,
    /// Progress or context information (e.g., a mode skipped for lack of data).
    Note,
    /// A problem that was recovered from (default substituted or batch skipped).
    Warning,
    /// A definite problem that aborts the run.
    Error,
}

impl Severity {
    /// Returns `true` if this severity is [`Error`](Severity::Error).
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }

    /// Returns `true` if a diagnostic of this severity should be shown.
    ///
    /// Warnings and errors are always shown; notes and help only in verbose mode.
    pub fn is_visible(self, verbose: bool) -> bool {
        verbose || self >= Severity::Warning
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Help => "help",
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        assert!(Severity::Help < Severity::Note);
        assert!(Severity::Note < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn visibility() {
        assert!(Severity::Error.is_visible(false));
        assert!(Severity::Warning.is_visible(false));
        assert!(!Severity::Note.is_visible(false));
        assert!(Severity::Note.is_visible(true));
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Severity::Error), "error");
        assert_eq!(format!("{}", Severity::Warning), "warning");
        assert_eq!(format!("{}", Severity::Note), "note");
        assert_eq!(format!("{}", Severity::Help), "help");
    }
}
