//! Diagnostic creation and accumulation for timing analysis findings.
//!
//! Findings such as unclocked registers, combinational loops, and violated
//! endpoints are reported as structured [`Diagnostic`] values with a severity
//! and a category-prefixed code. The thread-safe [`DiagnosticSink`] collects
//! them for the caller to render however it likes.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use severity::Severity;
pub use sink::DiagnosticSink;
