//! Collects coverage warnings for later rendering.

use crate::code::DiagnosticCode;
use crate::diagnostic::Diagnostic;
use std::cell::RefCell;

/// An accumulator for coverage warnings.
///
/// Emitting only needs a shared reference. Not `Sync`.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning.
    pub fn emit(&self, diag: Diagnostic) {
        self.diagnostics.borrow_mut().push(diag);
    }

    /// Number of recorded warnings with `code`.
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|diag| diag.code == code)
            .count()
    }

    /// Takes every recorded warning, leaving the sink empty.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.borrow_mut())
    }
}
