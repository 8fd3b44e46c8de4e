//! Coverage warnings for timing analysis.
//!
//! Partially constrained designs are normal, so gaps in constraint coverage
//! are warnings, not errors. The analyzer emits a [`Diagnostic`] per kind of
//! gap into a [`DiagnosticSink`]; report or CLI code renders them later
//! through `Display`.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod sink;

pub use code::DiagnosticCode;
pub use diagnostic::Diagnostic;
pub use sink::DiagnosticSink;
