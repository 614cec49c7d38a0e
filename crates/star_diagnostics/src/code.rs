//! Diagnostic codes with category prefixes for structured message identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
///
/// Each category maps to a single-character prefix used in diagnostic code
/// display (e.g., `C001` for a configuration issue, `Q002` for a failed query).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Configuration diagnostics (missing or defaulted settings), prefixed with `C`.
    Config,
    /// Scenario availability diagnostics, prefixed with `S`.
    Scenario,
    /// Timing source query diagnostics, prefixed with `Q`.
    Query,
    /// Fatal run errors (environment, output directory), prefixed with `E`.
    Error,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Config => 'C',
            Category::Scenario => 'S',
            Category::Query => 'Q',
            Category::Error => 'E',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric identifier.
///
/// Displayed as the category prefix followed by a zero-padded 3-digit number.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
