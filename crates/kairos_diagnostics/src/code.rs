//! Timing coverage codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a coverage diagnostic reports. Displayed as `T001`, `T002`, ...
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Startpoints that received no arrival time.
    UnconstrainedStartpoints,
    /// Endpoints that received no required time.
    UnconstrainedEndpoints,
    /// A launch/capture domain pair reaching an endpoint with no constraint.
    UnconstrainedDomainPair,
}

impl DiagnosticCode {
    /// Returns the stable number of this code.
    pub fn number(self) -> u16 {
        match self {
            DiagnosticCode::UnconstrainedStartpoints => 1,
            DiagnosticCode::UnconstrainedEndpoints => 2,
            DiagnosticCode::UnconstrainedDomainPair => 3,
        }
    }

    /// Returns the fix suggested for this code.
    pub fn help(self) -> &'static str {
        match self {
            DiagnosticCode::UnconstrainedStartpoints => {
                "add an input constraint or a clock domain to the source nodes"
            }
            DiagnosticCode::UnconstrainedEndpoints => {
                "add an output constraint or a clock constraint for the endpoint domain"
            }
            DiagnosticCode::UnconstrainedDomainPair => {
                "add a setup or hold constraint for the domain pair, or cut the crossing"
            }
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{:03}", self.number())
    }
}
