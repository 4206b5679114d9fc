//! Diagnostic creation, severity management, and rendering.
//!
//! Architecture and layout problems that do not abort a build (unused tile
//! types, clipped regions, ambiguous placements) are reported as structured
//! [`Diagnostic`] values. The thread-safe [`DiagnosticSink`] accumulates them
//! and forwards each one to the `log` facade, and [`DiagnosticRenderer`]
//! implementations format them for the terminal or as JSON.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
