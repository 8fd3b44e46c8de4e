//! Coverage warnings.

use crate::code::DiagnosticCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A coverage warning: timing that was not checked against any constraint.
///
/// `subjects` names what the warning is about: node handles for startpoint
/// and endpoint counts, `launch -> capture` for a domain pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The kind of gap.
    pub code: DiagnosticCode,
    /// One-line summary.
    pub message: String,
    /// Nodes or domain pairs concerned.
    pub subjects: Vec<String>,
}

impl Diagnostic {
    /// Creates a warning with no subjects.
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            subjects: Vec::new(),
        }
    }

    /// Adds the subjects the warning is about.
    pub fn with_subjects<I>(mut self, subjects: I) -> Self
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        self.subjects
            .extend(subjects.into_iter().map(|subject| subject.to_string()));
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "warning[{}]: {}", self.code, self.message)?;
        if !self.subjects.is_empty() {
            write!(f, " ({})", self.subjects.join(", "))?;
        }
        write!(f, "\n  = help: {}", self.code.help())
    }
}
