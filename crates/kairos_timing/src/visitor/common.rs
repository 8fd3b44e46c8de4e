//! The tag visitor shared by setup and hold analysis.

use super::ops::{AnalysisOps, HoldOps, SetupOps};
use super::{EndpointCoverage, NodeUpdate, TagVisitor, TraversalContext};
use crate::constraints::TimingConstraints;
use crate::graph::{EdgeKind, NodeType, TimingGraph};
use crate::ids::{DomainId, EdgeId, NodeId};
use crate::tags::{NodeTags, TagKind, TagList, TimingTag};
use smallvec::{smallvec, SmallVec};
use std::marker::PhantomData;

/// Visitor for setup analysis.
pub type SetupVisitor = CommonVisitor<SetupOps>;

/// Visitor for hold analysis.
pub type HoldVisitor = CommonVisitor<HoldOps>;

const ARRIVAL_KINDS: [TagKind; 3] = [
    TagKind::DataArrival,
    TagKind::ClockLaunch,
    TagKind::ClockCapture,
];

/// Tag storage plus the propagation rules of one analysis.
#[derive(Debug, Clone)]
pub struct CommonVisitor<O> {
    node_tags: Vec<NodeTags>,
    edge_slacks: Vec<TagList>,
    _ops: PhantomData<O>,
}

impl<O: AnalysisOps> CommonVisitor<O> {
    /// Creates empty tag storage sized for `graph`.
    pub fn new(graph: &TimingGraph) -> Self {
        Self {
            node_tags: vec![NodeTags::default(); graph.node_count()],
            edge_slacks: vec![TagList::new(); graph.edge_count()],
            _ops: PhantomData,
        }
    }

    /// Returns every tag of a node.
    pub fn node_tags(&self, node: NodeId) -> &NodeTags {
        &self.node_tags[node.index()]
    }

    /// Returns the tags of one kind on a node.
    pub fn tags(&self, node: NodeId, kind: TagKind) -> &TagList {
        self.node_tags[node.index()].get(kind)
    }

    /// Returns the slack tags of an edge.
    pub fn edge_slacks(&self, edge: EdgeId) -> &TagList {
        &self.edge_slacks[edge.index()]
    }

    /// Returns the launch/capture domain pairs reaching timing endpoint `node`
    /// that no setup or hold constraint covers.
    ///
    /// A launch domain is reported only if it can reach none of the capture
    /// domains of the endpoint; it is then paired with each of them. Empty
    /// for nodes that are not endpoints and for endpoints with no capture
    /// domain, which are unconstrained as a whole.
    pub fn unanalyzed_pairs(
        &self,
        graph: &TimingGraph,
        constraints: &TimingConstraints,
        node: NodeId,
    ) -> Vec<(DomainId, DomainId)> {
        let tags = &self.node_tags[node.index()];
        let captures: SmallVec<[DomainId; 2]> = match graph.node_type(node) {
            NodeType::RegisterDataSink => tags
                .get(TagKind::ClockCapture)
                .iter()
                .map(|tag| tag.domain)
                .collect(),
            NodeType::OutputSink => {
                match (constraints.output_constraint(node), graph.node_domain(node)) {
                    (Some(_), Some(domain)) => smallvec![domain],
                    _ => SmallVec::new(),
                }
            }
            _ => return Vec::new(),
        };

        let mut pairs = Vec::new();
        for arrival in tags.get(TagKind::DataArrival) {
            let launch = arrival.domain;
            if captures
                .iter()
                .any(|&capture| constraints.should_analyze(launch, capture))
            {
                continue;
            }
            pairs.extend(captures.iter().map(|&capture| (launch, capture)));
        }
        pairs
    }

    /// Derives the required tags of a timing endpoint from its own arrival
    /// side. Other nodes are left untouched.
    fn seed_required(&mut self, cx: &TraversalContext<'_>, node: NodeId) {
        let tags = &mut self.node_tags[node.index()];
        let mut required = TagList::new();
        match cx.graph.node_type(node) {
            NodeType::RegisterDataSink => {
                for arrival in tags.get(TagKind::DataArrival) {
                    for capture in tags.get(TagKind::ClockCapture) {
                        let Some(constraint) =
                            O::clock_constraint(cx.constraints, arrival.domain, capture.domain)
                        else {
                            continue;
                        };
                        required.merge(
                            TimingTag::new(capture.time + constraint, arrival.domain, None),
                            O::required_wins,
                        );
                    }
                }
            }
            NodeType::OutputSink => {
                let (Some(output_delay), Some(capture)) = (
                    cx.constraints.output_constraint(node),
                    cx.graph.node_domain(node),
                ) else {
                    return;
                };
                for arrival in tags.get(TagKind::DataArrival) {
                    if let Some(constraint) =
                        O::clock_constraint(cx.constraints, arrival.domain, capture)
                    {
                        required.set(TimingTag::new(
                            constraint - output_delay,
                            arrival.domain,
                            None,
                        ));
                    }
                }
            }
            _ => return,
        }
        *tags.get_mut(TagKind::DataRequired) = required;
    }
}

/// Borrows one node's tags for reading and another's for writing.
fn split_pair(tags: &mut [NodeTags], read: NodeId, write: NodeId) -> (&NodeTags, &mut NodeTags) {
    let (read, write) = (read.index(), write.index());
    assert_ne!(read, write, "self-loop on node n{read} in a levelized graph");
    if read < write {
        let (lo, hi) = tags.split_at_mut(write);
        (&lo[read], &mut hi[0])
    } else {
        let (lo, hi) = tags.split_at_mut(read);
        (&hi[0], &mut lo[write])
    }
}

impl<O: AnalysisOps> TagVisitor for CommonVisitor<O> {
    fn reset_node(&mut self, node: NodeId) {
        self.node_tags[node.index()].clear();
    }

    fn reset_edge(&mut self, edge: EdgeId) {
        self.edge_slacks[edge.index()].clear();
    }

    fn do_arrival_pre_traverse_node(&mut self, cx: &TraversalContext<'_>, node: NodeId) -> bool {
        let graph = cx.graph;
        if graph.node_type(node) == NodeType::ConstantGenerator {
            return true;
        }
        let Some(domain) = graph.node_domain(node) else {
            return false;
        };
        let tags = &mut self.node_tags[node.index()];
        if graph.node_is_clock_source(node) {
            tags.get_mut(TagKind::ClockLaunch)
                .set(TimingTag::new(0.0, domain, None));
            tags.get_mut(TagKind::ClockCapture)
                .set(TimingTag::new(0.0, domain, None));
            return true;
        }
        match cx.constraints.input_constraint(node) {
            Some(input_delay) => {
                tags.get_mut(TagKind::DataArrival)
                    .set(TimingTag::new(input_delay, domain, None));
                true
            }
            None => false,
        }
    }

    fn do_required_pre_traverse_node(
        &mut self,
        cx: &TraversalContext<'_>,
        node: NodeId,
    ) -> EndpointCoverage {
        self.seed_required(cx, node);
        let mut launches: Vec<DomainId> = self
            .unanalyzed_pairs(cx.graph, cx.constraints, node)
            .into_iter()
            .map(|(launch, _)| launch)
            .collect();
        launches.dedup();
        if !launches.is_empty() {
            tracing::trace!(
                analysis = O::NAME,
                %node,
                ?launches,
                "arrivals reach endpoint without a domain constraint"
            );
        }
        EndpointCoverage {
            constrained: !self.node_tags[node.index()]
                .get(TagKind::DataRequired)
                .is_empty(),
            unanalyzed_domains: launches.len(),
        }
    }

    fn do_arrival_traverse_node(
        &mut self,
        cx: &TraversalContext<'_>,
        node: NodeId,
        stale_in: &[EdgeId],
    ) -> NodeUpdate {
        let graph = cx.graph;
        let before = self.node_tags[node.index()].clone();

        let tags = &mut self.node_tags[node.index()];
        for &edge in stale_in {
            let src = graph.edge_src(edge);
            match graph.edge_kind(edge) {
                EdgeKind::Combinational => {
                    for kind in ARRIVAL_KINDS {
                        tags.get_mut(kind).remove_origin(src);
                    }
                }
                EdgeKind::ClockLaunch => tags.get_mut(TagKind::DataArrival).clear(),
                EdgeKind::ClockCapture => tags.get_mut(TagKind::ClockCapture).remove_origin(src),
            }
        }

        for &edge in graph.node_in_edges(node) {
            let src = graph.edge_src(edge);
            let (from, to) = split_pair(&mut self.node_tags, src, node);
            match graph.edge_kind(edge) {
                EdgeKind::Combinational => {
                    let delay = O::edge_delay(cx.delays, edge);
                    for kind in [TagKind::DataArrival, TagKind::ClockLaunch] {
                        for tag in from.get(kind) {
                            to.get_mut(kind).merge(
                                TimingTag::new(tag.time + delay, tag.domain, Some(src)),
                                O::arrival_wins,
                            );
                        }
                    }
                    for tag in from.get(TagKind::ClockCapture) {
                        to.get_mut(TagKind::ClockCapture).merge(
                            TimingTag::new(tag.time + delay, tag.domain, Some(src)),
                            O::required_wins,
                        );
                    }
                }
                EdgeKind::ClockLaunch => {
                    let delay = O::edge_delay(cx.delays, edge);
                    for tag in from.get(TagKind::ClockLaunch) {
                        to.get_mut(TagKind::DataArrival).merge(
                            TimingTag::new(tag.time + delay, tag.domain, Some(src)),
                            O::arrival_wins,
                        );
                    }
                }
                EdgeKind::ClockCapture => {
                    let offset = O::capture_offset(cx.delays, edge);
                    for tag in from.get(TagKind::ClockCapture) {
                        to.get_mut(TagKind::ClockCapture).merge(
                            TimingTag::new(tag.time + offset, tag.domain, Some(src)),
                            O::required_wins,
                        );
                    }
                }
            }
        }

        self.seed_required(cx, node);

        let after = &self.node_tags[node.index()];
        NodeUpdate {
            arrival_changed: ARRIVAL_KINDS
                .iter()
                .any(|&kind| before.get(kind) != after.get(kind)),
            required_changed: before.get(TagKind::DataRequired)
                != after.get(TagKind::DataRequired),
        }
    }

    fn do_required_traverse_node(
        &mut self,
        cx: &TraversalContext<'_>,
        node: NodeId,
        stale_out: &[EdgeId],
    ) -> bool {
        let graph = cx.graph;
        if graph.node_type(node).is_endpoint() {
            return false;
        }
        let before = self.node_tags[node.index()]
            .get(TagKind::DataRequired)
            .clone();

        let required = self.node_tags[node.index()].get_mut(TagKind::DataRequired);
        for &edge in stale_out {
            required.remove_origin(graph.edge_sink(edge));
        }

        for &edge in graph.node_out_edges(node) {
            if graph.edge_kind(edge) != EdgeKind::Combinational {
                continue;
            }
            let sink = graph.edge_sink(edge);
            let delay = O::edge_delay(cx.delays, edge);
            let (from, to) = split_pair(&mut self.node_tags, sink, node);
            for tag in from.get(TagKind::DataRequired) {
                to.get_mut(TagKind::DataRequired).merge(
                    TimingTag::new(tag.time - delay, tag.domain, Some(sink)),
                    O::required_wins,
                );
            }
        }

        before != *self.node_tags[node.index()].get(TagKind::DataRequired)
    }

    fn do_slack_traverse_node(&mut self, _cx: &TraversalContext<'_>, node: NodeId) {
        let tags = &mut self.node_tags[node.index()];
        let mut slack = TagList::new();
        for required in tags.get(TagKind::DataRequired) {
            if let Some(arrival) = tags.get(TagKind::DataArrival).time(required.domain) {
                slack.set(TimingTag::new(
                    O::slack(arrival, required.time),
                    required.domain,
                    None,
                ));
            }
        }
        *tags.get_mut(TagKind::Slack) = slack;
    }

    fn do_slack_traverse_edge(&mut self, cx: &TraversalContext<'_>, edge: EdgeId) {
        let graph = cx.graph;
        let slacks = &mut self.edge_slacks[edge.index()];
        slacks.clear();
        if graph.edge_kind(edge) != EdgeKind::Combinational {
            return;
        }
        let delay = O::edge_delay(cx.delays, edge);
        let arrivals = self.node_tags[graph.edge_src(edge).index()].get(TagKind::DataArrival);
        let required = self.node_tags[graph.edge_sink(edge).index()].get(TagKind::DataRequired);
        for req in required {
            if let Some(arrival) = arrivals.time(req.domain) {
                slacks.set(TimingTag::new(
                    O::slack(arrival + delay, req.time),
                    req.domain,
                    None,
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::TimingConstraints;
    use crate::delay::{Delay, EdgeDelays};
    use crate::ids::DomainId;

    struct Io {
        graph: TimingGraph,
        constraints: TimingConstraints,
        delays: EdgeDelays,
        clk: DomainId,
        inp: NodeId,
        out: NodeId,
        edge: EdgeId,
    }

    /// input --(2.0)--> output, both in `clk`, setup 10 / hold 0.
    fn io_path() -> Io {
        let mut constraints = TimingConstraints::new();
        let clk = constraints.create_clock_domain("clk");
        let mut graph = TimingGraph::new();
        let inp = graph.add_node(NodeType::InputSource, Some(clk), false).unwrap();
        let out = graph.add_node(NodeType::OutputSink, Some(clk), false).unwrap();
        let edge = graph.add_edge(inp, out, EdgeKind::Combinational).unwrap();
        graph.levelize().unwrap();
        constraints.add_setup_clock_constraint(clk, clk, 10.0);
        constraints.add_hold_clock_constraint(clk, clk, 0.0);
        constraints.add_input_constraint(inp, 1.0);
        constraints.add_output_constraint(out, 0.5);
        let delays = EdgeDelays::uniform(1, Delay::fixed(2.0));
        Io {
            graph,
            constraints,
            delays,
            clk,
            inp,
            out,
            edge,
        }
    }

    fn run<O: AnalysisOps>(io: &Io, visitor: &mut CommonVisitor<O>) {
        let cx = TraversalContext::new(&io.graph, &io.constraints, &io.delays);
        assert!(visitor.do_arrival_pre_traverse_node(&cx, io.inp));
        visitor.do_arrival_traverse_node(&cx, io.out, &[]);
        assert_eq!(
            visitor.do_required_pre_traverse_node(&cx, io.out),
            EndpointCoverage {
                constrained: true,
                unanalyzed_domains: 0
            }
        );
        visitor.do_slack_traverse_node(&cx, io.out);
        visitor.do_slack_traverse_edge(&cx, io.edge);
    }

    #[test]
    fn setup_io_path() {
        let io = io_path();
        let mut v = SetupVisitor::new(&io.graph);
        run(&io, &mut v);
        assert_eq!(v.tags(io.out, TagKind::DataArrival).time(io.clk), Some(3.0));
        assert_eq!(v.tags(io.out, TagKind::DataRequired).time(io.clk), Some(9.5));
        assert_eq!(v.tags(io.out, TagKind::Slack).time(io.clk), Some(6.5));
        assert_eq!(v.edge_slacks(io.edge).time(io.clk), Some(6.5));
        let tag = v.tags(io.out, TagKind::DataArrival).get(io.clk).unwrap();
        assert_eq!(tag.origin, Some(io.inp));
    }

    #[test]
    fn hold_io_path() {
        let io = io_path();
        let mut v = HoldVisitor::new(&io.graph);
        run(&io, &mut v);
        assert_eq!(v.tags(io.out, TagKind::DataRequired).time(io.clk), Some(-0.5));
        assert_eq!(v.tags(io.out, TagKind::Slack).time(io.clk), Some(3.5));
    }

    #[test]
    fn stale_edge_is_recomputed() {
        let mut io = io_path();
        let mut v = SetupVisitor::new(&io.graph);
        run(&io, &mut v);

        io.delays.set_delay(io.edge, Delay::fixed(1.0));
        let cx = TraversalContext::new(&io.graph, &io.constraints, &io.delays);
        let update = v.do_arrival_traverse_node(&cx, io.out, &[io.edge]);
        assert!(update.arrival_changed);
        assert!(!update.required_changed);
        assert_eq!(v.tags(io.out, TagKind::DataArrival).time(io.clk), Some(2.0));

        let again = v.do_arrival_traverse_node(&cx, io.out, &[io.edge]);
        assert!(!again.any());
    }

    #[test]
    fn unconstrained_startpoints() {
        let mut constraints = TimingConstraints::new();
        let clk = constraints.create_clock_domain("clk");
        let mut graph = TimingGraph::new();
        let bare = graph.add_node(NodeType::InputSource, None, false).unwrap();
        let no_delay = graph.add_node(NodeType::InputSource, Some(clk), false).unwrap();
        let constant = graph.add_node(NodeType::ConstantGenerator, None, false).unwrap();
        let clock = graph.add_node(NodeType::ClockSource, Some(clk), true).unwrap();
        graph.levelize().unwrap();
        let delays = EdgeDelays::new(0);
        let cx = TraversalContext::new(&graph, &constraints, &delays);

        let mut v = SetupVisitor::new(&graph);
        assert!(!v.do_arrival_pre_traverse_node(&cx, bare));
        assert!(!v.do_arrival_pre_traverse_node(&cx, no_delay));
        assert!(v.do_arrival_pre_traverse_node(&cx, constant));
        assert!(v.node_tags(constant).is_empty());
        assert!(v.do_arrival_pre_traverse_node(&cx, clock));
        assert_eq!(v.tags(clock, TagKind::ClockLaunch).time(clk), Some(0.0));
        assert_eq!(v.tags(clock, TagKind::ClockCapture).time(clk), Some(0.0));
    }

    #[test]
    fn register_capture_derives_required() {
        let mut constraints = TimingConstraints::new();
        let clk = constraints.create_clock_domain("clk");
        let mut graph = TimingGraph::new();
        let clock = graph.add_node(NodeType::ClockSource, Some(clk), true).unwrap();
        let pin = graph.add_node(NodeType::RegisterClockPin, None, false).unwrap();
        let inp = graph.add_node(NodeType::InputSource, Some(clk), false).unwrap();
        let d = graph.add_node(NodeType::RegisterDataSink, None, false).unwrap();
        let e_clk = graph.add_edge(clock, pin, EdgeKind::Combinational).unwrap();
        let e_cap = graph.add_edge(pin, d, EdgeKind::ClockCapture).unwrap();
        let e_dat = graph.add_edge(inp, d, EdgeKind::Combinational).unwrap();
        graph.levelize().unwrap();
        constraints.add_setup_clock_constraint(clk, clk, 10.0);
        constraints.add_hold_clock_constraint(clk, clk, 0.0);
        constraints.add_input_constraint(inp, 0.0);

        let mut delays = EdgeDelays::new(graph.edge_count());
        delays.set_delay(e_clk, Delay::new(0.5, 1.0));
        delays.set_delay(e_dat, Delay::new(2.0, 3.0));
        delays.set_check_times(e_cap, 0.25, 0.25);
        let cx = TraversalContext::new(&graph, &constraints, &delays);

        let mut setup = SetupVisitor::new(&graph);
        let mut hold = HoldVisitor::new(&graph);
        for v in [&mut setup as &mut dyn TagVisitor, &mut hold] {
            v.do_arrival_pre_traverse_node(&cx, clock);
            v.do_arrival_pre_traverse_node(&cx, inp);
            v.do_arrival_traverse_node(&cx, pin, &[]);
            let update = v.do_arrival_traverse_node(&cx, d, &[]);
            assert!(update.required_changed);
            v.do_slack_traverse_node(&cx, d);
        }

        assert_eq!(setup.tags(d, TagKind::ClockCapture).time(clk), Some(0.75));
        assert_eq!(setup.tags(d, TagKind::DataRequired).time(clk), Some(10.75));
        assert_eq!(setup.tags(d, TagKind::Slack).time(clk), Some(7.75));
        assert_eq!(hold.tags(d, TagKind::ClockCapture).time(clk), Some(0.75));
        assert_eq!(hold.tags(d, TagKind::DataRequired).time(clk), Some(0.75));
        assert_eq!(hold.tags(d, TagKind::Slack).time(clk), Some(1.25));
    }

    #[test]
    fn required_propagates_only_through_combinational_edges() {
        let io = io_path();
        let mut v = SetupVisitor::new(&io.graph);
        run(&io, &mut v);
        let cx = TraversalContext::new(&io.graph, &io.constraints, &io.delays);
        assert!(v.do_required_traverse_node(&cx, io.inp, &[]));
        assert_eq!(v.tags(io.inp, TagKind::DataRequired).time(io.clk), Some(7.5));
        assert!(!v.do_required_traverse_node(&cx, io.inp, &[io.edge]));
        assert!(!v.do_required_traverse_node(&cx, io.out, &[]));
    }

    #[test]
    fn unconstrained_launch_domain_is_reported_per_endpoint() {
        let mut constraints = TimingConstraints::new();
        let a = constraints.create_clock_domain("a");
        let b = constraints.create_clock_domain("b");
        let mut graph = TimingGraph::new();
        let in_a = graph.add_node(NodeType::InputSource, Some(a), false).unwrap();
        let in_b = graph.add_node(NodeType::InputSource, Some(b), false).unwrap();
        let out = graph.add_node(NodeType::OutputSink, Some(a), false).unwrap();
        graph.add_edge(in_a, out, EdgeKind::Combinational).unwrap();
        graph.add_edge(in_b, out, EdgeKind::Combinational).unwrap();
        graph.levelize().unwrap();
        constraints.add_setup_clock_constraint(a, a, 10.0);
        constraints.add_input_constraint(in_a, 0.0);
        constraints.add_input_constraint(in_b, 0.0);
        constraints.add_output_constraint(out, 0.0);
        let delays = EdgeDelays::uniform(graph.edge_count(), Delay::fixed(1.0));
        let cx = TraversalContext::new(&graph, &constraints, &delays);

        let mut v = SetupVisitor::new(&graph);
        v.do_arrival_pre_traverse_node(&cx, in_a);
        v.do_arrival_pre_traverse_node(&cx, in_b);
        v.do_arrival_traverse_node(&cx, out, &[]);
        assert_eq!(v.tags(out, TagKind::DataArrival).len(), 2);
        assert_eq!(v.tags(out, TagKind::DataRequired).len(), 1);
        assert_eq!(
            v.do_required_pre_traverse_node(&cx, out),
            EndpointCoverage {
                constrained: true,
                unanalyzed_domains: 1
            }
        );
        assert_eq!(v.unanalyzed_pairs(&graph, &constraints, out), vec![(b, a)]);
        assert!(v.unanalyzed_pairs(&graph, &constraints, in_b).is_empty());

        // A hold-only constraint still counts as analyzed.
        constraints.add_hold_clock_constraint(b, a, 0.0);
        assert!(v.unanalyzed_pairs(&graph, &constraints, out).is_empty());
    }
}
