//! Walker that only revisits work reachable from invalidated edges.
//!
//! Invalidating an edge queues its sink for the arrival pass and its source
//! for the required pass, and marks the edge stale in both directions. Each
//! visited node drops the tags determined through its stale edges and is
//! recomputed from all of its edges. A node whose arrival tags change makes
//! its out-edges stale and queues their sinks; a node whose required tags
//! change makes its in-edges stale and queues their sources. Slack is then
//! recomputed for the changed nodes and the edges around them only.

use super::queue::LevelQueue;
use super::{level_of, pre_traverse_endpoints, pre_traverse_startpoints, TimingWalker, WalkStats};
use crate::graph::TimingGraph;
use crate::ids::{EdgeId, NodeId};
use crate::visitor::{TagVisitor, TraversalContext};

/// Incremental traversal driven by per-level work queues.
#[derive(Debug, Clone)]
pub struct IncrWalker {
    invalidated: Vec<EdgeId>,
    is_invalidated: Vec<bool>,
    arr_stale: Vec<bool>,
    req_stale: Vec<bool>,
    stale_edges: Vec<EdgeId>,
    arrival_queue: LevelQueue,
    required_queue: LevelQueue,
    modified: Vec<NodeId>,
    is_modified: Vec<bool>,
    has_baseline: bool,
}

impl IncrWalker {
    /// Creates a walker sized for `graph` with no baseline.
    pub fn new(graph: &TimingGraph) -> Self {
        let (nodes, edges, levels) = (graph.node_count(), graph.edge_count(), graph.level_count());
        Self {
            invalidated: Vec::new(),
            is_invalidated: vec![false; edges],
            arr_stale: vec![false; edges],
            req_stale: vec![false; edges],
            stale_edges: Vec::new(),
            arrival_queue: LevelQueue::new(nodes, levels),
            required_queue: LevelQueue::new(nodes, levels),
            modified: Vec::new(),
            is_modified: vec![false; nodes],
            has_baseline: false,
        }
    }

    /// Returns the edges invalidated since the last update.
    pub fn invalidated_edges(&self) -> &[EdgeId] {
        &self.invalidated
    }

    /// Returns `true` once an update (or a full walk) has produced complete tags.
    pub fn has_baseline(&self) -> bool {
        self.has_baseline
    }

    fn mark_arr_stale(&mut self, edge: EdgeId) {
        let i = edge.index();
        if !self.arr_stale[i] && !self.req_stale[i] {
            self.stale_edges.push(edge);
        }
        self.arr_stale[i] = true;
    }

    fn mark_req_stale(&mut self, edge: EdgeId) {
        let i = edge.index();
        if !self.arr_stale[i] && !self.req_stale[i] {
            self.stale_edges.push(edge);
        }
        self.req_stale[i] = true;
    }

    fn mark_modified(&mut self, node: NodeId) {
        let flag = &mut self.is_modified[node.index()];
        if !*flag {
            *flag = true;
            self.modified.push(node);
        }
    }

    fn clear_modified(&mut self) {
        for node in self.modified.drain(..) {
            self.is_modified[node.index()] = false;
        }
    }

    fn clear_pending(&mut self) {
        for edge in self.invalidated.drain(..) {
            self.is_invalidated[edge.index()] = false;
        }
        for edge in self.stale_edges.drain(..) {
            self.arr_stale[edge.index()] = false;
            self.req_stale[edge.index()] = false;
        }
        self.arrival_queue.clear();
        self.required_queue.clear();
    }

    fn arrival_pass<V: TagVisitor + ?Sized>(
        &mut self,
        cx: &TraversalContext<'_>,
        visitor: &mut V,
    ) -> usize {
        let graph = cx.graph;
        let mut bucket = Vec::new();
        let mut stale = Vec::new();
        let mut visited = 0;
        while self.arrival_queue.take_lowest(&mut bucket).is_some() {
            for &node in &bucket {
                stale.clear();
                stale.extend(
                    graph
                        .node_in_edges(node)
                        .iter()
                        .copied()
                        .filter(|edge| self.arr_stale[edge.index()]),
                );
                let update = visitor.do_arrival_traverse_node(cx, node, &stale);
                visited += 1;

                if update.arrival_changed {
                    self.mark_modified(node);
                    for &edge in graph.node_out_edges(node) {
                        self.mark_arr_stale(edge);
                        let sink = graph.edge_sink(edge);
                        self.arrival_queue.push(sink, level_of(graph, sink));
                    }
                }
                if update.required_changed {
                    self.mark_modified(node);
                    self.queue_fanin_required(graph, node);
                }
            }
        }
        visited
    }

    fn required_pass<V: TagVisitor + ?Sized>(
        &mut self,
        cx: &TraversalContext<'_>,
        visitor: &mut V,
    ) -> usize {
        let graph = cx.graph;
        let mut bucket = Vec::new();
        let mut stale = Vec::new();
        let mut visited = 0;
        while self.required_queue.take_highest(&mut bucket).is_some() {
            for &node in &bucket {
                stale.clear();
                stale.extend(
                    graph
                        .node_out_edges(node)
                        .iter()
                        .copied()
                        .filter(|edge| self.req_stale[edge.index()]),
                );
                let changed = visitor.do_required_traverse_node(cx, node, &stale);
                visited += 1;

                if changed {
                    self.mark_modified(node);
                    self.queue_fanin_required(graph, node);
                }
            }
        }
        visited
    }

    fn queue_fanin_required(&mut self, graph: &TimingGraph, node: NodeId) {
        for &edge in graph.node_in_edges(node) {
            self.mark_req_stale(edge);
            let src = graph.edge_src(edge);
            self.required_queue.push(src, level_of(graph, src));
        }
    }

    fn slack_pass<V: TagVisitor + ?Sized>(
        &mut self,
        cx: &TraversalContext<'_>,
        visitor: &mut V,
    ) -> (usize, usize) {
        let graph = cx.graph;
        self.modified.sort_unstable();

        let mut edges = self.invalidated.clone();
        for &node in &self.modified {
            visitor.do_slack_traverse_node(cx, node);
            edges.extend_from_slice(graph.node_in_edges(node));
            edges.extend_from_slice(graph.node_out_edges(node));
        }
        edges.sort_unstable();
        edges.dedup();
        for &edge in &edges {
            visitor.do_slack_traverse_edge(cx, edge);
        }
        (self.modified.len(), edges.len())
    }
}

impl TimingWalker for IncrWalker {
    const INCREMENTAL: bool = true;

    fn for_graph(graph: &TimingGraph) -> Self {
        Self::new(graph)
    }

    fn invalidate_edge(&mut self, graph: &TimingGraph, edge: EdgeId) -> bool {
        assert!(
            edge.index() < self.is_invalidated.len(),
            "edge {edge} is not in the timing graph ({} edges)",
            self.is_invalidated.len()
        );
        if self.is_invalidated[edge.index()] {
            return false;
        }
        self.is_invalidated[edge.index()] = true;
        self.invalidated.push(edge);
        self.mark_arr_stale(edge);
        self.mark_req_stale(edge);
        let (src, sink) = (graph.edge_src(edge), graph.edge_sink(edge));
        self.arrival_queue.push(sink, level_of(graph, sink));
        self.required_queue.push(src, level_of(graph, src));
        true
    }

    fn clear_invalidated(&mut self) {
        self.clear_pending();
        self.clear_modified();
    }

    fn mark_baseline(&mut self) {
        self.has_baseline = true;
    }

    fn modified_nodes(&self) -> &[NodeId] {
        &self.modified
    }

    fn do_update<V: TagVisitor + ?Sized>(
        &mut self,
        cx: &TraversalContext<'_>,
        visitor: &mut V,
    ) -> WalkStats {
        let graph = cx.graph;
        self.clear_modified();

        let first = !self.has_baseline;
        tracing::trace!(
            first,
            arrival_queued = self.arrival_queue.len(),
            required_queued = self.required_queue.len(),
            "starting incremental walk"
        );
        let mut coverage = None;
        let mut unconstrained_startpoints = 0;
        if first {
            for node in graph.nodes() {
                visitor.reset_node(node);
                let level = level_of(graph, node);
                self.arrival_queue.push(node, level);
                self.required_queue.push(node, level);
            }
            for edge in graph.edges() {
                visitor.reset_edge(edge);
                self.invalidate_edge(graph, edge);
            }
            unconstrained_startpoints = pre_traverse_startpoints(cx, visitor);
        }

        let arrival_nodes = self.arrival_pass(cx, visitor);
        if first {
            coverage = Some(pre_traverse_endpoints(cx, visitor, unconstrained_startpoints));
        }
        let required_nodes = self.required_pass(cx, visitor);

        let (slack_nodes, slack_edges) = if first {
            for node in graph.nodes() {
                visitor.do_slack_traverse_node(cx, node);
            }
            for edge in graph.edges() {
                visitor.do_slack_traverse_edge(cx, edge);
            }
            (graph.node_count(), graph.edge_count())
        } else {
            self.slack_pass(cx, visitor)
        };

        self.clear_pending();
        self.has_baseline = true;

        let stats = WalkStats {
            arrival_nodes,
            required_nodes,
            slack_nodes,
            slack_edges,
            coverage,
        };
        tracing::trace!(?stats, modified = self.modified.len(), "incremental walk");
        stats
    }
}
