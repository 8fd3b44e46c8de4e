//! Tag visitors: the per-node and per-edge timing computations driven by the
//! walkers.
//!
//! A walker decides *which* nodes and edges are visited and in what order; a
//! [`TagVisitor`] decides *what* happens on each visit and owns the resulting
//! tags. The set of visitors is closed: [`SetupVisitor`], [`HoldVisitor`]
//! and the combined [`SetupHoldVisitor`].

mod combined;
mod common;
mod ops;

pub use combined::SetupHoldVisitor;
pub use common::{CommonVisitor, HoldVisitor, SetupVisitor};
pub use ops::{AnalysisOps, HoldOps, SetupOps};

use crate::constraints::TimingConstraints;
use crate::delay::DelayCalculator;
use crate::graph::TimingGraph;
use crate::ids::{EdgeId, NodeId};
use std::ops::BitOr;

/// Read-only inputs shared by every visit of one update.
#[derive(Clone, Copy)]
pub struct TraversalContext<'a> {
    /// The levelized timing graph.
    pub graph: &'a TimingGraph,
    /// Validated constraints for the graph.
    pub constraints: &'a TimingConstraints,
    /// Edge delays for this update.
    pub delays: &'a dyn DelayCalculator,
}

impl<'a> TraversalContext<'a> {
    /// Bundles the inputs of one update.
    pub fn new(
        graph: &'a TimingGraph,
        constraints: &'a TimingConstraints,
        delays: &'a dyn DelayCalculator,
    ) -> Self {
        Self {
            graph,
            constraints,
            delays,
        }
    }
}

/// What changed on a node during an arrival visit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeUpdate {
    /// Arrival-side tags (data arrival, clock launch, clock capture) changed.
    pub arrival_changed: bool,
    /// Required tags re-derived on a timing endpoint changed.
    pub required_changed: bool,
}

impl NodeUpdate {
    /// Returns `true` if anything changed.
    pub fn any(self) -> bool {
        self.arrival_changed || self.required_changed
    }
}

impl BitOr for NodeUpdate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            arrival_changed: self.arrival_changed || rhs.arrival_changed,
            required_changed: self.required_changed || rhs.required_changed,
        }
    }
}

/// Constraint coverage of one timing endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndpointCoverage {
    /// At least one required time was derived.
    pub constrained: bool,
    /// Launch domains whose arrivals reach the endpoint with no setup or hold
    /// constraint towards any of its capture domains.
    pub unanalyzed_domains: usize,
}

impl BitOr for EndpointCoverage {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            constrained: self.constrained || rhs.constrained,
            unanalyzed_domains: self.unanalyzed_domains.max(rhs.unanalyzed_domains),
        }
    }
}

/// Per-node and per-edge timing computations.
///
/// Traverse methods receive the in- or out-edges that became stale since the
/// previous visit. Tags determined through a stale edge are dropped before
/// the node is recomputed from all of its edges; a full walk passes an empty
/// slice after resetting the node.
pub trait TagVisitor {
    /// Drops every tag of a node.
    fn reset_node(&mut self, node: NodeId);

    /// Drops the slack tags of an edge.
    fn reset_edge(&mut self, edge: EdgeId);

    /// Seeds a level-0 node. Returns `false` for an unconstrained startpoint.
    fn do_arrival_pre_traverse_node(&mut self, cx: &TraversalContext<'_>, node: NodeId) -> bool;

    /// Seeds a primary output and reports how well it is constrained.
    fn do_required_pre_traverse_node(
        &mut self,
        cx: &TraversalContext<'_>,
        node: NodeId,
    ) -> EndpointCoverage;

    /// Recomputes the arrival-side tags of a node from its in-edges.
    fn do_arrival_traverse_node(
        &mut self,
        cx: &TraversalContext<'_>,
        node: NodeId,
        stale_in: &[EdgeId],
    ) -> NodeUpdate;

    /// Recomputes the required tags of a node from its out-edges. Returns
    /// `true` if they changed.
    fn do_required_traverse_node(
        &mut self,
        cx: &TraversalContext<'_>,
        node: NodeId,
        stale_out: &[EdgeId],
    ) -> bool;

    /// Recomputes the slack tags of a node.
    fn do_slack_traverse_node(&mut self, cx: &TraversalContext<'_>, node: NodeId);

    /// Recomputes the slack tags of an edge.
    fn do_slack_traverse_edge(&mut self, cx: &TraversalContext<'_>, edge: EdgeId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_update_or() {
        let a = NodeUpdate {
            arrival_changed: true,
            required_changed: false,
        };
        let b = NodeUpdate {
            arrival_changed: false,
            required_changed: true,
        };
        assert_eq!(
            a | b,
            NodeUpdate {
                arrival_changed: true,
                required_changed: true
            }
        );
        assert!(!NodeUpdate::default().any());
    }

    #[test]
    fn endpoint_coverage_or() {
        let setup = EndpointCoverage {
            constrained: false,
            unanalyzed_domains: 2,
        };
        let hold = EndpointCoverage {
            constrained: true,
            unanalyzed_domains: 1,
        };
        assert_eq!(
            setup | hold,
            EndpointCoverage {
                constrained: true,
                unanalyzed_domains: 2
            }
        );
    }
}
