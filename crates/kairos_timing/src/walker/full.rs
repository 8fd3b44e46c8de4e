//! Walker that recomputes every node and edge on each update.

use super::{pre_traverse_endpoints, pre_traverse_startpoints, TimingWalker, WalkStats};
use crate::graph::TimingGraph;
use crate::ids::EdgeId;
use crate::visitor::{TagVisitor, TraversalContext};

/// Full traversal: reset, arrival, required and slack over the whole graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullWalker;

impl TimingWalker for FullWalker {
    const INCREMENTAL: bool = false;

    fn for_graph(_graph: &TimingGraph) -> Self {
        FullWalker
    }

    fn invalidate_edge(&mut self, _graph: &TimingGraph, _edge: EdgeId) -> bool {
        false
    }

    fn clear_invalidated(&mut self) {}

    fn do_update<V: TagVisitor + ?Sized>(
        &mut self,
        cx: &TraversalContext<'_>,
        visitor: &mut V,
    ) -> WalkStats {
        let graph = cx.graph;
        for node in graph.nodes() {
            visitor.reset_node(node);
        }
        for edge in graph.edges() {
            visitor.reset_edge(edge);
        }

        let unconstrained_startpoints = pre_traverse_startpoints(cx, visitor);
        for level in graph.levels() {
            for &node in graph.level_nodes(level) {
                visitor.do_arrival_traverse_node(cx, node, &[]);
            }
        }

        let coverage = pre_traverse_endpoints(cx, visitor, unconstrained_startpoints);
        for level in graph.levels().rev() {
            for &node in graph.level_nodes(level) {
                visitor.do_required_traverse_node(cx, node, &[]);
            }
        }

        for node in graph.nodes() {
            visitor.do_slack_traverse_node(cx, node);
        }
        for edge in graph.edges() {
            visitor.do_slack_traverse_edge(cx, edge);
        }

        WalkStats {
            arrival_nodes: graph.node_count(),
            required_nodes: graph.node_count(),
            slack_nodes: graph.node_count(),
            slack_edges: graph.edge_count(),
            coverage: Some(coverage),
        }
    }
}
