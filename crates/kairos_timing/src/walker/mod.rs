//! Traversal strategies.
//!
//! A walker decides which nodes a [`TagVisitor`](crate::visitor::TagVisitor)
//! visits during an update and in which order: arrival times level by level
//! from the inputs, required times level by level from the outputs, then
//! slack.

mod full;
mod incr;
mod queue;

pub use full::FullWalker;
pub use incr::IncrWalker;

use crate::graph::TimingGraph;
use crate::ids::{EdgeId, LevelId, NodeId};
use crate::visitor::{TagVisitor, TraversalContext};

/// Number of startpoints and endpoints left without timing constraints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Coverage {
    /// Level-0 nodes that received no arrival tag.
    pub unconstrained_startpoints: usize,
    /// Primary outputs that received no required tag.
    pub unconstrained_endpoints: usize,
    /// Constrained primary outputs also reached by a launch domain with no
    /// constraint towards any of their capture domains.
    pub partially_constrained_endpoints: usize,
}

/// Work done by one update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Nodes visited by the arrival traversal.
    pub arrival_nodes: usize,
    /// Nodes visited by the required traversal.
    pub required_nodes: usize,
    /// Nodes whose slack was recomputed.
    pub slack_nodes: usize,
    /// Edges whose slack was recomputed.
    pub slack_edges: usize,
    /// Coverage counts, when the pre-traversals ran.
    pub coverage: Option<Coverage>,
}

/// A traversal strategy.
pub trait TimingWalker {
    /// Whether updates only revisit invalidated work.
    const INCREMENTAL: bool;

    /// Creates a walker sized for `graph`.
    fn for_graph(graph: &TimingGraph) -> Self
    where
        Self: Sized;

    /// Records that the delay of `edge` changed. Returns `true` if the edge
    /// was not already pending.
    fn invalidate_edge(&mut self, graph: &TimingGraph, edge: EdgeId) -> bool;

    /// Forgets all pending invalidations.
    fn clear_invalidated(&mut self);

    /// Records that the visitor's tags are complete and consistent, so that
    /// the next update only needs to revisit invalidated work.
    fn mark_baseline(&mut self) {}

    /// Nodes whose tags changed during the last update, if tracked.
    fn modified_nodes(&self) -> &[NodeId] {
        &[]
    }

    /// Runs one update.
    fn do_update<V: TagVisitor + ?Sized>(
        &mut self,
        cx: &TraversalContext<'_>,
        visitor: &mut V,
    ) -> WalkStats;
}

/// Returns the level of `node`, panicking on an unlevelized node.
pub(crate) fn level_of(graph: &TimingGraph, node: NodeId) -> LevelId {
    match graph.node_level(node) {
        Some(level) => level,
        None => panic!("node {node} has no level; the timing graph must be levelized before analysis"),
    }
}

/// Runs the arrival pre-traversal over level 0.
pub(crate) fn pre_traverse_startpoints<V: TagVisitor + ?Sized>(
    cx: &TraversalContext<'_>,
    visitor: &mut V,
) -> usize {
    let graph = cx.graph;
    match graph.levels().next() {
        Some(first) => graph
            .level_nodes(first)
            .iter()
            .filter(|&&node| !visitor.do_arrival_pre_traverse_node(cx, node))
            .count(),
        None => 0,
    }
}

/// Runs the required pre-traversal over the primary outputs and completes
/// the coverage counts.
pub(crate) fn pre_traverse_endpoints<V: TagVisitor + ?Sized>(
    cx: &TraversalContext<'_>,
    visitor: &mut V,
    unconstrained_startpoints: usize,
) -> Coverage {
    let mut coverage = Coverage {
        unconstrained_startpoints,
        ..Coverage::default()
    };
    for &node in cx.graph.primary_outputs() {
        let endpoint = visitor.do_required_pre_traverse_node(cx, node);
        if !endpoint.constrained {
            coverage.unconstrained_endpoints += 1;
        } else if endpoint.unanalyzed_domains > 0 {
            coverage.partially_constrained_endpoints += 1;
        }
    }
    coverage
}
