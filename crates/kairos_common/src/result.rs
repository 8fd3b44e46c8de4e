//! Consistency-check results.

use std::fmt;

/// Result of an internal consistency check.
///
/// `Err` means a structure handed to the engine is inconsistent: a bug in
/// Kairos or in the collaborator that built or deserialized it. Timing
/// computed from such a structure cannot be trusted.
pub type KairosResult<T> = Result<T, InternalError>;

/// The structural invariant a consistency check found broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Invariant {
    /// Every stored handle refers to an existing node or edge.
    HandleRange,
    /// Fanin and fanout lists agree with the edge table.
    Adjacency,
    /// Level buckets partition the nodes and every edge climbs levels.
    Levels,
    /// The primary outputs are exactly the nodes without fanout.
    PrimaryOutputs,
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Invariant::HandleRange => "handle range",
            Invariant::Adjacency => "adjacency",
            Invariant::Levels => "levelization",
            Invariant::PrimaryOutputs => "primary outputs",
        };
        f.write_str(name)
    }
}

/// A broken internal invariant, with the offending handles in `detail`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal timing error ({invariant}): {detail}")]
pub struct InternalError {
    /// The invariant that does not hold.
    pub invariant: Invariant,
    /// What was found, naming the handles involved.
    pub detail: String,
}

impl InternalError {
    /// Creates an error for a broken `invariant`.
    pub fn new(invariant: Invariant, detail: impl Into<String>) -> Self {
        Self {
            invariant,
            detail: detail.into(),
        }
    }
}
