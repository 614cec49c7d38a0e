//! Diagnostic accumulator shared by every phase of a reporting run.

use crate::code::Category;
use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// An accumulator for diagnostics emitted during a reporting run.
///
/// Phases take `&DiagnosticSink` and [`emit`](Self::emit) into it. The CLI
/// drains it between phases with [`take_all`](Self::take_all); the counters
/// survive draining so the end-of-run summary can still report how many
/// batches were skipped or settings defaulted.
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    error_count: AtomicUsize,
    warning_count: AtomicUsize,
    problems: Mutex<HashMap<Category, usize>>,
}

impl DiagnosticSink {
    /// Creates a new empty diagnostic sink.
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            error_count: AtomicUsize::new(0),
            warning_count: AtomicUsize::new(0),
            problems: Mutex::new(HashMap::new()),
        }
    }

    /// Emits a diagnostic into the sink.
    pub fn emit(&self, diag: Diagnostic) {
        match diag.severity {
            Severity::Error => {
                self.error_count.fetch_add(1, Ordering::Relaxed);
            }
            Severity::Warning => {
                self.warning_count.fetch_add(1, Ordering::Relaxed);
            }
            Severity::Note | Severity::Help => {}
        }
        if diag.severity >= Severity::Warning {
            *self
                .problems
                .lock()
                .unwrap()
                .entry(diag.code.category)
                .or_insert(0) += 1;
        }
        let mut diagnostics = self.diagnostics.lock().unwrap();
        diagnostics.push(diag);
    }

    /// Returns `true` if any error-severity diagnostics have been emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count.load(Ordering::Relaxed) > 0
    }

    /// Returns the number of error-severity diagnostics emitted so far.
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Returns the number of warning-severity diagnostics emitted so far.
    pub fn warning_count(&self) -> usize {
        self.warning_count.load(Ordering::Relaxed)
    }

    /// Returns the number of warnings and errors emitted with codes in `category`.
    pub fn problem_count(&self, category: Category) -> usize {
        self.problems
            .lock()
            .unwrap()
            .get(&category)
            .copied()
            .unwrap_or(0)
    }

    /// Takes all accumulated diagnostics, leaving the sink empty.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        let mut diagnostics = self.diagnostics.lock().unwrap();
        std::mem::take(&mut *diagnostics)
    }

    /// Returns a snapshot of all accumulated diagnostics without draining.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let diagnostics = self.diagnostics.lock().unwrap();
        diagnostics.clone()
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}
