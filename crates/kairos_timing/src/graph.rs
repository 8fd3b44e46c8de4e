//! Levelized timing graph.
//!
//! The [`TimingGraph`] is a directed acyclic graph of timing nodes (pins,
//! sources and sinks) and edges (delay arcs). It stores topology only; timing
//! values live in the tag storage of the visitors.
//!
//! Construction is append-only. [`TimingGraph::levelize`] is called once after
//! construction: it buckets nodes into topological levels, records the primary
//! outputs and freezes the topology.

use crate::error::GraphError;
use crate::ids::{DomainId, EdgeId, LevelId, NodeId};
use kairos_common::{InternalError, Invariant, KairosResult};
use serde::{Deserialize, Serialize};

/// A levelized timing graph for static timing analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingGraph {
    pub(crate) nodes: Vec<TimingNode>,
    pub(crate) edges: Vec<TimingEdge>,
    pub(crate) node_in_edges: Vec<Vec<EdgeId>>,
    pub(crate) node_out_edges: Vec<Vec<EdgeId>>,
    pub(crate) levels: Vec<Vec<NodeId>>,
    pub(crate) primary_outputs: Vec<NodeId>,
    pub(crate) levelized: bool,
}

/// Per-node attributes of the timing graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingNode {
    /// The functional type of this node.
    pub node_type: NodeType,
    /// The clock domain this node belongs to, if any.
    pub domain: Option<DomainId>,
    /// Whether this node originates a clock.
    pub is_clock_source: bool,
    /// Topological level, assigned by [`TimingGraph::levelize`].
    pub level: Option<LevelId>,
}

/// The type of a timing graph node.
///
/// Mirrors the pin/source/sink roles of a mapped netlist: I/O pads are split
/// into a source/sink node and a pin node, registers into data pins, an
/// internal data sink/source pair and a clock pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Off-chip input (timing startpoint).
    InputSource,
    /// Pin of an input pad driving the core.
    InputDriverPin,
    /// Pin of an output pad receiving a core signal.
    OutputReceiverPin,
    /// Off-chip output (timing endpoint).
    OutputSink,
    /// Input pin of a combinational primitive.
    PrimitiveInputPin,
    /// Output pin of a combinational primitive.
    PrimitiveOutputPin,
    /// Data input pin of a register.
    RegisterInputPin,
    /// Data output pin of a register.
    RegisterOutputPin,
    /// Internal capture point of a register (timing endpoint).
    RegisterDataSink,
    /// Internal launch point of a register (timing startpoint).
    RegisterDataSource,
    /// Clock pin of a register.
    RegisterClockPin,
    /// Origin of a clock net.
    ClockSource,
    /// Output pin of a clock source driving the clock network.
    ClockOutputPin,
    /// Constant driver; never a constrained startpoint.
    ConstantGenerator,
}

impl NodeType {
    /// Returns `true` for node types that terminate timing paths.
    pub fn is_endpoint(self) -> bool {
        matches!(self, NodeType::OutputSink | NodeType::RegisterDataSink)
    }
}

/// A directed edge of the timing graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingEdge {
    /// The driving node.
    pub src: NodeId,
    /// The driven node.
    pub sink: NodeId,
    /// The semantic kind of the edge.
    pub kind: EdgeKind,
}

/// The semantic kind of a timing edge.
///
/// Supplied by the collaborator building the graph. Only propagation and
/// invalidation logic looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Data or clock-network delay.
    Combinational,
    /// Register clock pin to register data source (clock-to-q).
    ClockLaunch,
    /// Register clock pin to register data sink (setup/hold check).
    ClockCapture,
}

impl TimingGraph {
    /// Creates an empty timing graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node and returns its handle.
    pub fn add_node(
        &mut self,
        node_type: NodeType,
        domain: Option<DomainId>,
        is_clock_source: bool,
    ) -> Result<NodeId, GraphError> {
        if self.levelized {
            return Err(GraphError::Frozen);
        }
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(TimingNode {
            node_type,
            domain,
            is_clock_source,
            level: None,
        });
        self.node_in_edges.push(Vec::new());
        self.node_out_edges.push(Vec::new());
        Ok(id)
    }

    /// Adds a directed edge between two existing nodes and returns its handle.
    pub fn add_edge(
        &mut self,
        src: NodeId,
        sink: NodeId,
        kind: EdgeKind,
    ) -> Result<EdgeId, GraphError> {
        if self.levelized {
            return Err(GraphError::Frozen);
        }
        for node in [src, sink] {
            if node.index() >= self.nodes.len() {
                return Err(GraphError::UnknownNode {
                    node,
                    node_count: self.nodes.len(),
                });
            }
        }
        if self.nodes[src.index()].node_type.is_endpoint() {
            return Err(GraphError::SinkFanout { node: src });
        }
        let id = EdgeId::from_index(self.edges.len());
        self.edges.push(TimingEdge { src, sink, kind });
        self.node_out_edges[src.index()].push(id);
        self.node_in_edges[sink.index()].push(id);
        Ok(id)
    }

    /// Buckets every node into a topological level and freezes the topology.
    ///
    /// Kahn layering: level 0 holds the nodes without fanin; a node moves to
    /// the next level once the last of its in-edges has been drained. Nodes
    /// without out-edges are recorded as primary outputs during the same pass.
    /// A node whose remaining fanin never reaches zero sits on a cycle.
    pub fn levelize(&mut self) -> Result<(), GraphError> {
        if self.levelized {
            return Err(GraphError::AlreadyLevelized);
        }

        let mut remaining_fanin: Vec<usize> = self.node_in_edges.iter().map(Vec::len).collect();
        let mut levels: Vec<Vec<NodeId>> = Vec::new();
        let mut primary_outputs = Vec::new();
        let mut current: Vec<NodeId> = remaining_fanin
            .iter()
            .enumerate()
            .filter(|&(_, &fanin)| fanin == 0)
            .map(|(i, _)| NodeId::from_index(i))
            .collect();
        let mut num_levelized = 0;

        while !current.is_empty() {
            let level = LevelId::from_index(levels.len());
            let mut next = Vec::new();
            for &node in &current {
                self.nodes[node.index()].level = Some(level);
                let out_edges = &self.node_out_edges[node.index()];
                if out_edges.is_empty() {
                    primary_outputs.push(node);
                }
                for &edge in out_edges {
                    let sink = self.edges[edge.index()].sink;
                    let fanin = &mut remaining_fanin[sink.index()];
                    *fanin -= 1;
                    if *fanin == 0 {
                        next.push(sink);
                    }
                }
            }
            num_levelized += current.len();
            levels.push(current);
            current = next;
        }

        if num_levelized != self.nodes.len() {
            for node in &mut self.nodes {
                node.level = None;
            }
            return Err(GraphError::Cycle {
                remaining: self.nodes.len() - num_levelized,
            });
        }

        tracing::debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            levels = levels.len(),
            primary_outputs = primary_outputs.len(),
            "levelized timing graph"
        );

        self.levels = levels;
        self.primary_outputs = primary_outputs;
        self.levelized = true;
        Ok(())
    }

    /// Returns `true` once [`levelize`](Self::levelize) has succeeded.
    pub fn is_levelized(&self) -> bool {
        self.levelized
    }

    /// Iterates over all node handles in storage order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId::from_index)
    }

    /// Iterates over all edge handles in storage order.
    pub fn edges(&self) -> impl ExactSizeIterator<Item = EdgeId> + '_ {
        (0..self.edges.len()).map(EdgeId::from_index)
    }

    /// Iterates over all level handles in increasing order.
    pub fn levels(&self) -> impl DoubleEndedIterator<Item = LevelId> + ExactSizeIterator + '_ {
        (0..self.levels.len()).map(LevelId::from_index)
    }

    /// Returns the nodes of a level.
    pub fn level_nodes(&self, level: LevelId) -> &[NodeId] {
        &self.levels[level.index()]
    }

    /// Returns the nodes without out-edges, in discovery order.
    pub fn primary_outputs(&self) -> &[NodeId] {
        &self.primary_outputs
    }

    /// Returns the in-edges of a node.
    pub fn node_in_edges(&self, node: NodeId) -> &[EdgeId] {
        &self.node_in_edges[node.index()]
    }

    /// Returns the out-edges of a node.
    pub fn node_out_edges(&self, node: NodeId) -> &[EdgeId] {
        &self.node_out_edges[node.index()]
    }

    /// Returns the number of in-edges of a node.
    pub fn num_node_in_edges(&self, node: NodeId) -> usize {
        self.node_in_edges[node.index()].len()
    }

    /// Returns the number of out-edges of a node.
    pub fn num_node_out_edges(&self, node: NodeId) -> usize {
        self.node_out_edges[node.index()].len()
    }

    /// Returns the attributes of a node.
    pub fn node(&self, node: NodeId) -> &TimingNode {
        &self.nodes[node.index()]
    }

    /// Returns the type of a node.
    pub fn node_type(&self, node: NodeId) -> NodeType {
        self.nodes[node.index()].node_type
    }

    /// Returns the clock domain of a node.
    pub fn node_domain(&self, node: NodeId) -> Option<DomainId> {
        self.nodes[node.index()].domain
    }

    /// Returns whether a node is a clock source.
    pub fn node_is_clock_source(&self, node: NodeId) -> bool {
        self.nodes[node.index()].is_clock_source
    }

    /// Returns the level of a node, or `None` before levelization.
    pub fn node_level(&self, node: NodeId) -> Option<LevelId> {
        self.nodes[node.index()].level
    }

    /// Returns an edge.
    pub fn edge(&self, edge: EdgeId) -> &TimingEdge {
        &self.edges[edge.index()]
    }

    /// Returns the source node of an edge.
    pub fn edge_src(&self, edge: EdgeId) -> NodeId {
        self.edges[edge.index()].src
    }

    /// Returns the sink node of an edge.
    pub fn edge_sink(&self, edge: EdgeId) -> NodeId {
        self.edges[edge.index()].sink
    }

    /// Returns the kind of an edge.
    pub fn edge_kind(&self, edge: EdgeId) -> EdgeKind {
        self.edges[edge.index()].kind
    }

    /// Returns the total number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the total number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the number of levels (zero before levelization).
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Checks the internal consistency of the graph.
    ///
    /// Every stored handle must be in range and the adjacency lists must
    /// agree with the edge table. Once levelized, every node must sit exactly
    /// once in the bucket of its level, every edge must go from a lower to a
    /// higher level, and the primary outputs must be exactly the nodes
    /// without out-edges. Never panics, so it can vet deserialized graphs.
    pub fn validate(&self) -> KairosResult<()> {
        let node_count = self.nodes.len();
        let edge_count = self.edges.len();
        if self.node_in_edges.len() != node_count || self.node_out_edges.len() != node_count {
            return Err(InternalError::new(
                Invariant::Adjacency,
                format!(
                    "{node_count} nodes but {} fanin and {} fanout lists",
                    self.node_in_edges.len(),
                    self.node_out_edges.len()
                ),
            ));
        }

        for (index, edge) in self.edges.iter().enumerate() {
            for node in [edge.src, edge.sink] {
                if node.index() >= node_count {
                    return Err(InternalError::new(
                        Invariant::HandleRange,
                        format!("e{index} references missing {node}"),
                    ));
                }
            }
        }
        for node in self.nodes() {
            let fanin = self.node_in_edges[node.index()].iter().map(|&e| (e, true));
            let fanout = self.node_out_edges[node.index()].iter().map(|&e| (e, false));
            for (edge, is_fanin) in fanin.chain(fanout) {
                let Some(stored) = self.edges.get(edge.index()) else {
                    return Err(InternalError::new(
                        Invariant::HandleRange,
                        format!("adjacency of {node} references missing {edge}"),
                    ));
                };
                let end = if is_fanin { stored.sink } else { stored.src };
                if end != node {
                    return Err(InternalError::new(
                        Invariant::Adjacency,
                        format!("{edge} listed on {node} but connects {} to {}", stored.src, stored.sink),
                    ));
                }
            }
        }
        for (index, edge) in self.edges.iter().enumerate() {
            let id = EdgeId::from_index(index);
            if !self.node_out_edges[edge.src.index()].contains(&id) {
                return Err(InternalError::new(
                    Invariant::Adjacency,
                    format!("{id} missing from out-edges of {}", edge.src),
                ));
            }
            if !self.node_in_edges[edge.sink.index()].contains(&id) {
                return Err(InternalError::new(
                    Invariant::Adjacency,
                    format!("{id} missing from in-edges of {}", edge.sink),
                ));
            }
        }
        let fanin_len: usize = self.node_in_edges.iter().map(Vec::len).sum();
        let fanout_len: usize = self.node_out_edges.iter().map(Vec::len).sum();
        if fanin_len != edge_count || fanout_len != edge_count {
            return Err(InternalError::new(
                Invariant::Adjacency,
                format!("{fanin_len} fanin and {fanout_len} fanout entries for {edge_count} edges"),
            ));
        }

        if !self.levelized {
            return Ok(());
        }

        let mut bucketed = vec![false; node_count];
        for (index, bucket) in self.levels.iter().enumerate() {
            let level = LevelId::from_index(index);
            for &node in bucket {
                let Some(stored) = self.nodes.get(node.index()) else {
                    return Err(InternalError::new(
                        Invariant::HandleRange,
                        format!("{level} lists missing {node}"),
                    ));
                };
                if stored.level != Some(level) {
                    return Err(InternalError::new(
                        Invariant::Levels,
                        format!("{node} listed in {level} but labelled otherwise"),
                    ));
                }
                if std::mem::replace(&mut bucketed[node.index()], true) {
                    return Err(InternalError::new(
                        Invariant::Levels,
                        format!("{node} listed twice in {level}"),
                    ));
                }
            }
        }
        if let Some(missing) = bucketed.iter().position(|&seen| !seen) {
            return Err(InternalError::new(
                Invariant::Levels,
                format!("{} is in no level", NodeId::from_index(missing)),
            ));
        }

        for (index, edge) in self.edges.iter().enumerate() {
            let src_level = self.nodes[edge.src.index()].level;
            let sink_level = self.nodes[edge.sink.index()].level;
            if src_level >= sink_level {
                return Err(InternalError::new(
                    Invariant::Levels,
                    format!("e{index} goes from {src_level:?} to {sink_level:?}; levels must strictly increase"),
                ));
            }
        }

        if let Some(&node) = self.primary_outputs.iter().find(|node| node.index() >= node_count) {
            return Err(InternalError::new(
                Invariant::HandleRange,
                format!("primary outputs list missing {node}"),
            ));
        }
        let mut expected: Vec<NodeId> = self
            .nodes()
            .filter(|&node| self.node_out_edges[node.index()].is_empty())
            .collect();
        let mut recorded = self.primary_outputs.clone();
        expected.sort_unstable();
        recorded.sort_unstable();
        if expected != recorded {
            return Err(InternalError::new(
                Invariant::PrimaryOutputs,
                "primary outputs do not match the nodes without fanout",
            ));
        }
        Ok(())
    }
}
