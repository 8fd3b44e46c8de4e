//! Setup and hold analysis in a single traversal.

use super::{EndpointCoverage, HoldVisitor, NodeUpdate, SetupVisitor, TagVisitor, TraversalContext};
use crate::graph::TimingGraph;
use crate::ids::{EdgeId, NodeId};

/// Runs a [`SetupVisitor`] and a [`HoldVisitor`] side by side.
///
/// A node counts as constrained or changed if either analysis says so.
#[derive(Debug, Clone)]
pub struct SetupHoldVisitor {
    /// Setup tags.
    pub setup: SetupVisitor,
    /// Hold tags.
    pub hold: HoldVisitor,
}

impl SetupHoldVisitor {
    /// Creates empty tag storage for both analyses.
    pub fn new(graph: &TimingGraph) -> Self {
        Self {
            setup: SetupVisitor::new(graph),
            hold: HoldVisitor::new(graph),
        }
    }
}

impl TagVisitor for SetupHoldVisitor {
    fn reset_node(&mut self, node: NodeId) {
        self.setup.reset_node(node);
        self.hold.reset_node(node);
    }

    fn reset_edge(&mut self, edge: EdgeId) {
        self.setup.reset_edge(edge);
        self.hold.reset_edge(edge);
    }

    fn do_arrival_pre_traverse_node(&mut self, cx: &TraversalContext<'_>, node: NodeId) -> bool {
        let setup = self.setup.do_arrival_pre_traverse_node(cx, node);
        let hold = self.hold.do_arrival_pre_traverse_node(cx, node);
        setup || hold
    }

    fn do_required_pre_traverse_node(
        &mut self,
        cx: &TraversalContext<'_>,
        node: NodeId,
    ) -> EndpointCoverage {
        self.setup.do_required_pre_traverse_node(cx, node)
            | self.hold.do_required_pre_traverse_node(cx, node)
    }

    fn do_arrival_traverse_node(
        &mut self,
        cx: &TraversalContext<'_>,
        node: NodeId,
        stale_in: &[EdgeId],
    ) -> NodeUpdate {
        self.setup.do_arrival_traverse_node(cx, node, stale_in)
            | self.hold.do_arrival_traverse_node(cx, node, stale_in)
    }

    fn do_required_traverse_node(
        &mut self,
        cx: &TraversalContext<'_>,
        node: NodeId,
        stale_out: &[EdgeId],
    ) -> bool {
        let setup = self.setup.do_required_traverse_node(cx, node, stale_out);
        let hold = self.hold.do_required_traverse_node(cx, node, stale_out);
        setup || hold
    }

    fn do_slack_traverse_node(&mut self, cx: &TraversalContext<'_>, node: NodeId) {
        self.setup.do_slack_traverse_node(cx, node);
        self.hold.do_slack_traverse_node(cx, node);
    }

    fn do_slack_traverse_edge(&mut self, cx: &TraversalContext<'_>, edge: EdgeId) {
        self.setup.do_slack_traverse_edge(cx, edge);
        self.hold.do_slack_traverse_edge(cx, edge);
    }
}
