//! Error types for timing graph construction, constraint validation,
//! configuration loading and analyzer setup.

use crate::ids::{DomainId, NodeId};
use kairos_common::InternalError;

/// Structural errors raised while building or levelizing a [`TimingGraph`].
///
/// [`TimingGraph`]: crate::graph::TimingGraph
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GraphError {
    /// An edge referenced a node handle that was never created.
    #[error("edge endpoint {node} does not exist (graph has {node_count} nodes)")]
    UnknownNode {
        /// The offending handle.
        node: NodeId,
        /// The number of nodes in the graph at the time of the call.
        node_count: usize,
    },

    /// The graph topology was modified after `levelize()`.
    #[error("timing graph topology is frozen after levelization")]
    Frozen,

    /// An edge was driven by a timing endpoint (output or register data sink).
    #[error("endpoint node {node} cannot drive an edge")]
    SinkFanout {
        /// The endpoint that was used as an edge source.
        node: NodeId,
    },

    /// Levelization found nodes whose fanin never drained.
    #[error("combinational cycle detected: {remaining} nodes could not be levelized")]
    Cycle {
        /// Number of nodes left without a level.
        remaining: usize,
    },

    /// `levelize()` was called more than once.
    #[error("timing graph is already levelized")]
    AlreadyLevelized,

    /// An operation requiring levels ran on an unlevelized graph.
    #[error("timing graph has not been levelized")]
    NotLevelized,
}

/// Constraint errors detected when validating constraints against a graph.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConstraintError {
    /// A node or constraint referenced a domain that was never created.
    #[error("unknown clock domain {domain}")]
    UnknownDomain {
        /// The offending domain handle.
        domain: DomainId,
    },

    /// A constraint references a domain no node of the graph belongs to.
    #[error("clock domain '{name}' ({domain}) is constrained but used by no node")]
    UnusedDomain {
        /// The unused domain.
        domain: DomainId,
        /// Its name.
        name: String,
    },

    /// An input/output constraint references a node outside the graph.
    #[error("I/O constraint on unknown node {node}")]
    UnknownNode {
        /// The offending node handle.
        node: NodeId,
    },

    /// An input/output constraint was placed on a node without a clock domain.
    #[error("I/O constraint on node {node} which has no clock domain")]
    NodeWithoutDomain {
        /// The constrained node.
        node: NodeId,
    },
}

/// Errors that can occur when loading or validating an analyzer configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Errors raised when constructing an analyzer.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The graph is structurally unusable (typically not levelized).
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The constraints failed validation against the graph.
    #[error(transparent)]
    Constraint(#[from] ConstraintError),

    /// The analyzer configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The graph failed its internal consistency check.
    #[error(transparent)]
    Internal(#[from] InternalError),
}
