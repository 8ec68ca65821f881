//! Compiler diagnostics reported by the host compiler for a model build unit.
//!
//! This crate provides structured [`Diagnostic`] messages with severity levels,
//! codes, and build-unit locations. The thread-safe [`DiagnosticSink`]
//! accumulates diagnostics from a compilation, and [`TerminalRenderer`] formats
//! them for the operator-facing error report.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod location;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use location::Location;
pub use renderer::{render_all, DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
