//! Timing analyzers: the public analysis API over a visitor and a walker
//! strategy.
//!
//! [`AdaptiveAnalyzer`] picks the incremental walker by default and falls
//! back to a full traversal when too many edges were invalidated since the
//! last update. [`FullAnalyzer`] and [`IncrAnalyzer`] always use one walker
//! and serve as references for each other.

use crate::config::AnalyzerConfig;
use crate::constraints::TimingConstraints;
use crate::delay::DelayCalculator;
use crate::error::{AnalysisError, GraphError};
use crate::graph::TimingGraph;
use crate::ids::{DomainId, EdgeId, NodeId};
use crate::profiling::ProfilingData;
use crate::tags::{NodeTags, TagKind, TagList};
use crate::visitor::{SetupHoldVisitor, TraversalContext};
use crate::walker::{Coverage, FullWalker, IncrWalker, TimingWalker, WalkStats};
use kairos_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use std::time::Instant;

/// Which walker an update used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisMode {
    /// Only invalidated work is revisited.
    Incremental,
    /// Every node and edge is recomputed.
    Full,
}

/// Which analyses an update refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateScope {
    /// Setup and hold.
    Both,
    /// Setup only.
    Setup,
    /// Hold only.
    Hold,
}

/// Decides how an analyzer runs each update.
pub trait UpdateStrategy {
    /// Creates the strategy for a graph.
    fn new(graph: &TimingGraph, config: &AnalyzerConfig) -> Self
    where
        Self: Sized;

    /// Records that the delay of `edge` changed.
    fn invalidate_edge(&mut self, graph: &TimingGraph, edge: EdgeId);

    /// Runs one update. `resync` is set when an analysis in `scope` missed
    /// invalidations during an earlier update of the other analysis.
    fn update(
        &mut self,
        cx: &TraversalContext<'_>,
        visitor: &mut SetupHoldVisitor,
        scope: UpdateScope,
        resync: bool,
    ) -> (AnalysisMode, WalkStats);

    /// Nodes whose tags changed during the last update, if tracked.
    fn modified_nodes(&self) -> &[NodeId];
}

fn walk<W: TimingWalker>(
    walker: &mut W,
    cx: &TraversalContext<'_>,
    visitor: &mut SetupHoldVisitor,
    scope: UpdateScope,
) -> WalkStats {
    match scope {
        UpdateScope::Both => walker.do_update(cx, visitor),
        UpdateScope::Setup => walker.do_update(cx, &mut visitor.setup),
        UpdateScope::Hold => walker.do_update(cx, &mut visitor.hold),
    }
}

/// Incremental by default, full once too many edges were invalidated.
#[derive(Debug, Clone)]
pub struct Adaptive {
    full: FullWalker,
    incr: IncrWalker,
    mode: AnalysisMode,
    num_invalidated: usize,
    threshold: f64,
}

impl Adaptive {
    /// Returns the walker the next update will use.
    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }
}

impl UpdateStrategy for Adaptive {
    fn new(graph: &TimingGraph, config: &AnalyzerConfig) -> Self {
        Self {
            full: FullWalker,
            incr: IncrWalker::new(graph),
            mode: AnalysisMode::Incremental,
            num_invalidated: 0,
            threshold: graph.edge_count() as f64 * config.incr_threshold_fraction,
        }
    }

    fn invalidate_edge(&mut self, graph: &TimingGraph, edge: EdgeId) {
        if self.mode == AnalysisMode::Full {
            return;
        }
        if self.incr.invalidate_edge(graph, edge) {
            self.num_invalidated += 1;
            if self.num_invalidated as f64 > self.threshold {
                tracing::debug!(
                    invalidated = self.num_invalidated,
                    threshold = self.threshold,
                    "switching to full timing update"
                );
                self.mode = AnalysisMode::Full;
            }
        }
    }

    fn update(
        &mut self,
        cx: &TraversalContext<'_>,
        visitor: &mut SetupHoldVisitor,
        scope: UpdateScope,
        resync: bool,
    ) -> (AnalysisMode, WalkStats) {
        let mode = if resync && self.incr.has_baseline() {
            AnalysisMode::Full
        } else {
            self.mode
        };
        let stats = match mode {
            AnalysisMode::Full => {
                let stats = walk(&mut self.full, cx, visitor, scope);
                self.incr.clear_invalidated();
                self.incr.mark_baseline();
                stats
            }
            AnalysisMode::Incremental => walk(&mut self.incr, cx, visitor, scope),
        };
        self.num_invalidated = 0;
        self.mode = AnalysisMode::Incremental;
        (mode, stats)
    }

    fn modified_nodes(&self) -> &[NodeId] {
        self.incr.modified_nodes()
    }
}

/// Always uses the walker `W`.
#[derive(Debug, Clone)]
pub struct Fixed<W> {
    walker: W,
}

impl<W: TimingWalker> UpdateStrategy for Fixed<W> {
    fn new(graph: &TimingGraph, _config: &AnalyzerConfig) -> Self {
        Self {
            walker: W::for_graph(graph),
        }
    }

    fn invalidate_edge(&mut self, graph: &TimingGraph, edge: EdgeId) {
        self.walker.invalidate_edge(graph, edge);
    }

    fn update(
        &mut self,
        cx: &TraversalContext<'_>,
        visitor: &mut SetupHoldVisitor,
        scope: UpdateScope,
        resync: bool,
    ) -> (AnalysisMode, WalkStats) {
        if resync {
            // A fresh walker has no baseline and recomputes everything.
            self.walker = W::for_graph(cx.graph);
        }
        let stats = walk(&mut self.walker, cx, visitor, scope);
        let mode = if W::INCREMENTAL {
            AnalysisMode::Incremental
        } else {
            AnalysisMode::Full
        };
        (mode, stats)
    }

    fn modified_nodes(&self) -> &[NodeId] {
        self.walker.modified_nodes()
    }
}

/// Static timing analyzer over a borrowed graph and constraints.
#[derive(Debug)]
pub struct TimingAnalyzer<'a, S> {
    graph: &'a TimingGraph,
    constraints: &'a TimingConstraints,
    visitor: SetupHoldVisitor,
    strategy: S,
    setup_synced: bool,
    hold_synced: bool,
    pending_changes: bool,
    coverage: Coverage,
    profiling: ProfilingData,
}

/// Analyzer switching between incremental and full updates.
pub type AdaptiveAnalyzer<'a> = TimingAnalyzer<'a, Adaptive>;

/// Analyzer using a single walker.
pub type FixedAnalyzer<'a, W> = TimingAnalyzer<'a, Fixed<W>>;

/// Analyzer that always runs full updates.
pub type FullAnalyzer<'a> = FixedAnalyzer<'a, FullWalker>;

/// Analyzer that always runs incremental updates.
pub type IncrAnalyzer<'a> = FixedAnalyzer<'a, IncrWalker>;

impl<'a, S: UpdateStrategy> TimingAnalyzer<'a, S> {
    /// Creates an analyzer for a levelized graph and its constraints.
    pub fn new(
        graph: &'a TimingGraph,
        constraints: &'a TimingConstraints,
        config: AnalyzerConfig,
    ) -> Result<Self, AnalysisError> {
        if !graph.is_levelized() {
            return Err(GraphError::NotLevelized.into());
        }
        graph.validate()?;
        constraints.validate(graph)?;
        config.validate()?;
        Ok(Self {
            graph,
            constraints,
            visitor: SetupHoldVisitor::new(graph),
            strategy: S::new(graph, &config),
            setup_synced: false,
            hold_synced: false,
            pending_changes: false,
            coverage: Coverage::default(),
            profiling: ProfilingData::default(),
        })
    }

    /// Records that the delay of `edge` changed since the last update.
    pub fn invalidate_edge(&mut self, edge: EdgeId) {
        self.pending_changes = true;
        self.strategy.invalidate_edge(self.graph, edge);
    }

    /// Updates setup and hold timing.
    pub fn update_timing(&mut self, delays: &dyn DelayCalculator) {
        self.update(delays, UpdateScope::Both);
    }

    /// Updates setup timing only.
    pub fn update_setup_timing(&mut self, delays: &dyn DelayCalculator) {
        self.update(delays, UpdateScope::Setup);
    }

    /// Updates hold timing only.
    pub fn update_hold_timing(&mut self, delays: &dyn DelayCalculator) {
        self.update(delays, UpdateScope::Hold);
    }

    fn update(&mut self, delays: &dyn DelayCalculator, scope: UpdateScope) {
        let cx = TraversalContext::new(self.graph, self.constraints, delays);
        let resync = match scope {
            UpdateScope::Both => !(self.setup_synced && self.hold_synced),
            UpdateScope::Setup => !self.setup_synced,
            UpdateScope::Hold => !self.hold_synced,
        };

        let start = Instant::now();
        let (mode, stats) = self
            .strategy
            .update(&cx, &mut self.visitor, scope, resync);
        let elapsed = start.elapsed();

        match scope {
            UpdateScope::Both => {
                self.setup_synced = true;
                self.hold_synced = true;
            }
            UpdateScope::Setup => {
                self.setup_synced = true;
                self.hold_synced &= !self.pending_changes;
            }
            UpdateScope::Hold => {
                self.hold_synced = true;
                self.setup_synced &= !self.pending_changes;
            }
        }
        self.pending_changes = false;

        if let Some(coverage) = stats.coverage {
            self.coverage = coverage;
        }
        self.profiling.record(mode, elapsed, &stats);
        tracing::debug!(
            ?mode,
            ?scope,
            arrival_nodes = stats.arrival_nodes,
            required_nodes = stats.required_nodes,
            slack_nodes = stats.slack_nodes,
            elapsed_sec = elapsed.as_secs_f64(),
            "timing update"
        );
    }

    /// Returns the graph under analysis.
    pub fn graph(&self) -> &'a TimingGraph {
        self.graph
    }

    /// Returns the update strategy.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Returns the setup tags of one kind on a node.
    pub fn setup_tags(&self, node: NodeId, kind: TagKind) -> &TagList {
        self.visitor.setup.tags(node, kind)
    }

    /// Returns the hold tags of one kind on a node.
    pub fn hold_tags(&self, node: NodeId, kind: TagKind) -> &TagList {
        self.visitor.hold.tags(node, kind)
    }

    /// Returns every setup tag of a node.
    pub fn setup_node_tags(&self, node: NodeId) -> &NodeTags {
        self.visitor.setup.node_tags(node)
    }

    /// Returns every hold tag of a node.
    pub fn hold_node_tags(&self, node: NodeId) -> &NodeTags {
        self.visitor.hold.node_tags(node)
    }

    /// Returns the setup slacks of an edge.
    pub fn setup_edge_slacks(&self, edge: EdgeId) -> &TagList {
        self.visitor.setup.edge_slacks(edge)
    }

    /// Returns the hold slacks of an edge.
    pub fn hold_edge_slacks(&self, edge: EdgeId) -> &TagList {
        self.visitor.hold.edge_slacks(edge)
    }

    /// Nodes whose tags changed during the last incremental update.
    pub fn modified_nodes(&self) -> &[NodeId] {
        self.strategy.modified_nodes()
    }

    /// Returns the profiling counters.
    pub fn profiling(&self) -> &ProfilingData {
        &self.profiling
    }

    /// Looks a profiling counter up by name.
    pub fn get_profiling_data(&self, key: &str) -> Option<f64> {
        self.profiling.get(key)
    }

    /// Returns the coverage counts of the last update that computed them.
    pub fn coverage(&self) -> Coverage {
        self.coverage
    }

    /// Level-0 nodes that received no arrival time.
    pub fn num_unconstrained_startpoints(&self) -> usize {
        self.coverage.unconstrained_startpoints
    }

    /// Primary outputs that received no required time.
    pub fn num_unconstrained_endpoints(&self) -> usize {
        self.coverage.unconstrained_endpoints
    }

    /// Constrained primary outputs also reached by an unconstrained launch
    /// domain.
    pub fn num_partially_constrained_endpoints(&self) -> usize {
        self.coverage.partially_constrained_endpoints
    }

    /// Launch/capture domain pairs whose paths reach a primary output but
    /// are covered by neither a setup nor a hold constraint, sorted.
    pub fn unanalyzed_domain_pairs(&self) -> Vec<(DomainId, DomainId)> {
        let mut pairs: Vec<_> = self
            .graph
            .primary_outputs()
            .iter()
            .flat_map(|&node| {
                let setup = self.visitor.setup.unanalyzed_pairs(self.graph, self.constraints, node);
                let hold = self.visitor.hold.unanalyzed_pairs(self.graph, self.constraints, node);
                setup.into_iter().chain(hold)
            })
            .collect();
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    /// Latest setup data arrival over the primary outputs.
    pub fn critical_path_delay(&self) -> Option<f64> {
        self.graph
            .primary_outputs()
            .iter()
            .flat_map(|&node| self.setup_tags(node, TagKind::DataArrival).iter())
            .map(|tag| tag.time)
            .reduce(f64::max)
    }

    /// Most negative setup slack over all endpoints, or `0.0` if none fails.
    pub fn setup_worst_negative_slack(&self) -> f64 {
        worst_negative_slack(&self.endpoint_slacks(|node| self.setup_tags(node, TagKind::Slack)))
    }

    /// Sum of the magnitudes of the failing setup endpoint slacks.
    pub fn setup_total_negative_slack(&self) -> f64 {
        total_negative_slack(&self.endpoint_slacks(|node| self.setup_tags(node, TagKind::Slack)))
    }

    /// Most negative hold slack over all endpoints, or `0.0` if none fails.
    pub fn hold_worst_negative_slack(&self) -> f64 {
        worst_negative_slack(&self.endpoint_slacks(|node| self.hold_tags(node, TagKind::Slack)))
    }

    /// Sum of the magnitudes of the failing hold endpoint slacks.
    pub fn hold_total_negative_slack(&self) -> f64 {
        total_negative_slack(&self.endpoint_slacks(|node| self.hold_tags(node, TagKind::Slack)))
    }

    /// Worst slack of each endpoint that has one.
    fn endpoint_slacks<'s>(&'s self, slacks: impl Fn(NodeId) -> &'s TagList) -> Vec<f64> {
        self.graph
            .nodes()
            .filter(|&node| self.graph.node_type(node).is_endpoint())
            .filter_map(|node| slacks(node).iter().map(|tag| tag.time).reduce(f64::min))
            .collect()
    }

    /// Emits coverage warnings into `sink`: one per kind of unconstrained
    /// startpoint or endpoint, and one per unanalyzed domain pair.
    pub fn report_coverage(&self, sink: &DiagnosticSink) {
        let Coverage {
            unconstrained_startpoints,
            unconstrained_endpoints,
            ..
        } = self.coverage;
        if unconstrained_startpoints > 0 {
            sink.emit(Diagnostic::new(
                DiagnosticCode::UnconstrainedStartpoints,
                format!("{unconstrained_startpoints} timing startpoints are unconstrained"),
            ));
        }
        if unconstrained_endpoints > 0 {
            sink.emit(Diagnostic::new(
                DiagnosticCode::UnconstrainedEndpoints,
                format!("{unconstrained_endpoints} timing endpoints are unconstrained"),
            ));
        }
        let name = |domain: DomainId| {
            self.constraints
                .clock_domain_name(domain)
                .map_or_else(|| domain.to_string(), str::to_owned)
        };
        for (launch, capture) in self.unanalyzed_domain_pairs() {
            sink.emit(
                Diagnostic::new(
                    DiagnosticCode::UnconstrainedDomainPair,
                    format!(
                        "paths from {} to {} are not analyzed",
                        name(launch),
                        name(capture)
                    ),
                )
                .with_subjects([format!("{launch} -> {capture}")]),
            );
        }
    }
}

impl<'a> AdaptiveAnalyzer<'a> {
    /// Returns the walker the next update will use.
    pub fn mode(&self) -> AnalysisMode {
        self.strategy.mode()
    }
}

fn worst_negative_slack(slacks: &[f64]) -> f64 {
    slacks.iter().copied().fold(0.0, f64::min)
}

fn total_negative_slack(slacks: &[f64]) -> f64 {
    slacks.iter().filter(|&&slack| slack < 0.0).map(|slack| -slack).sum()
}
