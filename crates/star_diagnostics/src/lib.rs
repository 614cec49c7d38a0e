//! Diagnostic creation, severity management, and terminal rendering.
//!
//! This crate provides structured [`Diagnostic`] messages with severity levels
//! and category codes. The [`DiagnosticSink`] accumulates diagnostics during a
//! reporting run (missing settings, unusable scenarios, failed path queries),
//! and [`TerminalRenderer`] formats them for stderr.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
