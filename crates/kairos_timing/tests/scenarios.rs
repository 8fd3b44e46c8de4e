//! End-to-end analysis scenarios: incremental chain updates, idempotence,
//! mode switching, clock-domain crossings and layout optimization.

use kairos_timing::{
    AdaptiveAnalyzer, AnalysisMode, AnalyzerConfig, Delay, DomainId, EdgeDelays, EdgeId, EdgeKind,
    FullAnalyzer, IncrAnalyzer, NodeId, NodeType, TagKind, TimingConstraints, TimingGraph,
};

struct Chain {
    graph: TimingGraph,
    constraints: TimingConstraints,
    delays: EdgeDelays,
    clk: DomainId,
    nodes: [NodeId; 4],
    edges: [EdgeId; 3],
}

/// A (input) -> B -> C -> D (output), every edge 1.0 ns.
fn chain() -> Chain {
    let mut constraints = TimingConstraints::new();
    let clk = constraints.create_clock_domain("clk");
    let mut graph = TimingGraph::new();
    let a = graph.add_node(NodeType::InputSource, Some(clk), false).unwrap();
    let b = graph.add_node(NodeType::PrimitiveOutputPin, None, false).unwrap();
    let c = graph.add_node(NodeType::PrimitiveOutputPin, None, false).unwrap();
    let d = graph.add_node(NodeType::OutputSink, Some(clk), false).unwrap();
    let ab = graph.add_edge(a, b, EdgeKind::Combinational).unwrap();
    let bc = graph.add_edge(b, c, EdgeKind::Combinational).unwrap();
    let cd = graph.add_edge(c, d, EdgeKind::Combinational).unwrap();
    graph.levelize().unwrap();
    constraints.add_input_constraint(a, 0.0);
    Chain {
        graph,
        constraints,
        delays: EdgeDelays::uniform(3, Delay::fixed(1.0)),
        clk,
        nodes: [a, b, c, d],
        edges: [ab, bc, cd],
    }
}

#[test]
fn chain_levels() {
    let ch = chain();
    for (expected, &node) in ch.nodes.iter().enumerate() {
        assert_eq!(ch.graph.node_level(node).unwrap().index(), expected);
    }
    assert_eq!(ch.graph.primary_outputs(), &[ch.nodes[3]]);
}

#[test]
fn chain_incremental_update_skips_upstream_nodes() {
    let mut ch = chain();
    let config = AnalyzerConfig {
        incr_threshold_fraction: 0.5,
    };
    let mut sta = AdaptiveAnalyzer::new(&ch.graph, &ch.constraints, config).unwrap();
    sta.update_timing(&ch.delays);
    let [a, b, c, d] = ch.nodes;
    assert_eq!(sta.setup_tags(d, TagKind::DataArrival).time(ch.clk), Some(3.0));

    let before_a = sta.setup_node_tags(a).clone();
    let before_b = sta.setup_node_tags(b).clone();

    ch.delays.set_delay(ch.edges[1], Delay::fixed(5.0));
    sta.invalidate_edge(ch.edges[1]);
    assert_eq!(sta.mode(), AnalysisMode::Incremental);
    sta.update_timing(&ch.delays);

    assert_eq!(sta.setup_tags(c, TagKind::DataArrival).time(ch.clk), Some(6.0));
    assert_eq!(sta.setup_tags(d, TagKind::DataArrival).time(ch.clk), Some(7.0));
    assert_eq!(sta.setup_node_tags(a), &before_a);
    assert_eq!(sta.setup_node_tags(b), &before_b);
    assert_eq!(sta.get_profiling_data("arrival_traversed_nodes"), Some(2.0));
    assert!(!sta.modified_nodes().contains(&a));
    assert!(!sta.modified_nodes().contains(&b));
    assert_eq!(sta.modified_nodes(), &[c, d]);
    assert_eq!(sta.profiling().num_incr_updates, 2);
}

#[test]
fn chain_default_threshold_falls_back_to_full() {
    let mut ch = chain();
    let mut sta =
        AdaptiveAnalyzer::new(&ch.graph, &ch.constraints, AnalyzerConfig::default()).unwrap();
    sta.update_timing(&ch.delays);

    // 3 edges * 0.1: a single invalidation is already past the threshold.
    ch.delays.set_delay(ch.edges[1], Delay::fixed(5.0));
    sta.invalidate_edge(ch.edges[1]);
    sta.update_timing(&ch.delays);
    assert_eq!(sta.profiling().num_full_updates, 1);
    assert_eq!(sta.setup_tags(ch.nodes[3], TagKind::DataArrival).time(ch.clk), Some(7.0));
}

#[test]
fn second_update_is_idempotent() {
    let ch = chain();
    let mut sta = IncrAnalyzer::new(&ch.graph, &ch.constraints, AnalyzerConfig::default()).unwrap();
    sta.update_timing(&ch.delays);
    let first: Vec<_> = ch
        .graph
        .nodes()
        .map(|n| (sta.setup_node_tags(n).clone(), sta.hold_node_tags(n).clone()))
        .collect();

    sta.update_timing(&ch.delays);
    let second: Vec<_> = ch
        .graph
        .nodes()
        .map(|n| (sta.setup_node_tags(n).clone(), sta.hold_node_tags(n).clone()))
        .collect();
    assert_eq!(first, second);
    assert_eq!(sta.get_profiling_data("arrival_traversed_nodes"), Some(0.0));
    assert_eq!(sta.get_profiling_data("required_traversed_nodes"), Some(0.0));
    assert_eq!(sta.get_profiling_data("slack_traversed_nodes"), Some(0.0));
    assert!(sta.modified_nodes().is_empty());
}

/// `n` independent input -> output paths.
fn parallel_paths(n: usize) -> (TimingGraph, TimingConstraints) {
    let mut constraints = TimingConstraints::new();
    let clk = constraints.create_clock_domain("clk");
    let mut graph = TimingGraph::new();
    let mut inputs = Vec::new();
    for _ in 0..n {
        let i = graph.add_node(NodeType::InputSource, Some(clk), false).unwrap();
        let o = graph.add_node(NodeType::OutputSink, Some(clk), false).unwrap();
        graph.add_edge(i, o, EdgeKind::Combinational).unwrap();
        inputs.push(i);
    }
    graph.levelize().unwrap();
    for i in inputs {
        constraints.add_input_constraint(i, 0.0);
    }
    (graph, constraints)
}

#[test]
fn mode_switch_threshold() {
    let (graph, constraints) = parallel_paths(20);
    let delays = EdgeDelays::uniform(20, Delay::fixed(1.0));
    let config = AnalyzerConfig {
        incr_threshold_fraction: 0.25,
    };
    let mut sta = AdaptiveAnalyzer::new(&graph, &constraints, config).unwrap();
    sta.update_timing(&delays);

    // 20 * 0.25 = 5: five distinct edges stay incremental.
    for e in 0..5 {
        sta.invalidate_edge(EdgeId::from_raw(e));
        sta.invalidate_edge(EdgeId::from_raw(e));
    }
    sta.update_timing(&delays);
    assert_eq!(sta.profiling().num_full_updates, 0);
    assert_eq!(sta.profiling().num_incr_updates, 2);

    // The sixth distinct edge crosses it.
    for e in 0..6 {
        sta.invalidate_edge(EdgeId::from_raw(e));
    }
    assert_eq!(sta.mode(), AnalysisMode::Full);
    sta.update_timing(&delays);
    assert_eq!(sta.profiling().num_full_updates, 1);
    assert_eq!(sta.profiling().num_incr_updates, 2);
    assert_eq!(sta.mode(), AnalysisMode::Incremental);
}

#[test]
fn cross_domain_paths_use_pair_constraints() {
    let mut tc = TimingConstraints::new();
    let fast = tc.create_clock_domain("fast");
    let slow = tc.create_clock_domain("slow");
    let mut g = TimingGraph::new();
    let in_fast = g.add_node(NodeType::InputSource, Some(fast), false).unwrap();
    let in_slow = g.add_node(NodeType::InputSource, Some(slow), false).unwrap();
    let join = g.add_node(NodeType::PrimitiveOutputPin, None, false).unwrap();
    let out = g.add_node(NodeType::OutputSink, Some(slow), false).unwrap();
    g.add_edge(in_fast, join, EdgeKind::Combinational).unwrap();
    g.add_edge(in_slow, join, EdgeKind::Combinational).unwrap();
    let to_out = g.add_edge(join, out, EdgeKind::Combinational).unwrap();
    g.levelize().unwrap();
    tc.add_input_constraint(in_fast, 0.5);
    tc.add_input_constraint(in_slow, 1.0);
    tc.add_output_constraint(out, 1.0);
    tc.add_setup_clock_constraint(fast, slow, 5.0);
    tc.add_setup_clock_constraint(slow, slow, 20.0);

    let delays = EdgeDelays::uniform(g.edge_count(), Delay::new(1.0, 2.0));
    let mut sta = FullAnalyzer::new(&g, &tc, AnalyzerConfig::default()).unwrap();
    sta.update_timing(&delays);

    let arrivals = sta.setup_tags(out, TagKind::DataArrival);
    assert_eq!(arrivals.len(), 2);
    assert_eq!(arrivals.time(fast), Some(4.5));
    assert_eq!(arrivals.time(slow), Some(5.0));
    assert_eq!(sta.setup_tags(out, TagKind::DataRequired).time(fast), Some(4.0));
    assert_eq!(sta.setup_tags(out, TagKind::DataRequired).time(slow), Some(19.0));
    assert_eq!(sta.setup_tags(out, TagKind::Slack).time(fast), Some(-0.5));
    assert_eq!(sta.setup_edge_slacks(to_out).time(fast), Some(-0.5));
    assert_eq!(sta.setup_worst_negative_slack(), -0.5);
    assert_eq!(sta.setup_total_negative_slack(), 0.5);

    // No hold constraints: no hold required times anywhere.
    assert!(sta.hold_tags(out, TagKind::DataRequired).is_empty());
    assert!(sta.hold_edge_slacks(to_out).is_empty());
}

#[test]
fn clock_skew_and_setup_time_shift_the_capture_edge() {
    let mut tc = TimingConstraints::new();
    let clk = tc.create_clock_domain("clk");
    let mut g = TimingGraph::new();
    let clock = g.add_node(NodeType::ClockSource, Some(clk), true).unwrap();
    let ck_a = g.add_node(NodeType::RegisterClockPin, None, false).unwrap();
    let q_a = g.add_node(NodeType::RegisterDataSource, None, false).unwrap();
    let ck_b = g.add_node(NodeType::RegisterClockPin, None, false).unwrap();
    let d_b = g.add_node(NodeType::RegisterDataSink, None, false).unwrap();
    let skew_a = g.add_edge(clock, ck_a, EdgeKind::Combinational).unwrap();
    let skew_b = g.add_edge(clock, ck_b, EdgeKind::Combinational).unwrap();
    let tco = g.add_edge(ck_a, q_a, EdgeKind::ClockLaunch).unwrap();
    let data = g.add_edge(q_a, d_b, EdgeKind::Combinational).unwrap();
    let check = g.add_edge(ck_b, d_b, EdgeKind::ClockCapture).unwrap();
    g.levelize().unwrap();
    tc.add_setup_clock_constraint(clk, clk, 10.0);
    tc.add_hold_clock_constraint(clk, clk, 0.0);

    let mut delays = EdgeDelays::new(g.edge_count());
    delays.set_delay(skew_a, Delay::new(0.5, 1.0));
    delays.set_delay(skew_b, Delay::new(1.5, 2.0));
    delays.set_delay(tco, Delay::new(0.25, 0.5));
    delays.set_delay(data, Delay::new(3.0, 6.0));
    delays.set_check_times(check, 0.5, 0.25);

    let mut sta = IncrAnalyzer::new(&g, &tc, AnalyzerConfig::default()).unwrap();
    sta.update_timing(&delays);

    // setup: arrival 1.0 + 0.5 + 6.0, required 2.0 - 0.5 + 10.0
    assert_eq!(sta.setup_tags(d_b, TagKind::DataArrival).time(clk), Some(7.5));
    assert_eq!(sta.setup_tags(d_b, TagKind::DataRequired).time(clk), Some(11.5));
    assert_eq!(sta.setup_tags(d_b, TagKind::Slack).time(clk), Some(4.0));
    // hold: arrival 0.5 + 0.25 + 3.0, required 1.5 + 0.25
    assert_eq!(sta.hold_tags(d_b, TagKind::DataArrival).time(clk), Some(3.75));
    assert_eq!(sta.hold_tags(d_b, TagKind::DataRequired).time(clk), Some(1.75));
    assert_eq!(sta.hold_tags(d_b, TagKind::Slack).time(clk), Some(2.0));

    // A later capture clock relaxes setup.
    delays.set_delay(skew_b, Delay::new(1.5, 3.0));
    sta.invalidate_edge(skew_b);
    sta.update_timing(&delays);
    assert_eq!(sta.setup_tags(d_b, TagKind::Slack).time(clk), Some(5.0));
    assert_eq!(sta.get_profiling_data("arrival_traversed_nodes"), Some(2.0));
}

#[test]
fn layout_optimization_preserves_results() {
    let mut tc = TimingConstraints::new();
    let clk = tc.create_clock_domain("clk");
    let mut g = TimingGraph::new();
    // Created sink-first so that storage order differs from level order.
    let out = g.add_node(NodeType::OutputSink, Some(clk), false).unwrap();
    let mid2 = g.add_node(NodeType::PrimitiveOutputPin, None, false).unwrap();
    let mid1 = g.add_node(NodeType::PrimitiveInputPin, None, false).unwrap();
    let inp = g.add_node(NodeType::InputSource, Some(clk), false).unwrap();
    let side = g.add_node(NodeType::InputSource, Some(clk), false).unwrap();
    g.add_edge(mid2, out, EdgeKind::Combinational).unwrap();
    g.add_edge(side, mid2, EdgeKind::Combinational).unwrap();
    g.add_edge(mid1, mid2, EdgeKind::Combinational).unwrap();
    g.add_edge(inp, mid1, EdgeKind::Combinational).unwrap();
    g.levelize().unwrap();
    tc.add_input_constraint(inp, 0.0);
    tc.add_input_constraint(side, 2.0);
    tc.add_output_constraint(out, 0.5);
    tc.add_setup_clock_constraint(clk, clk, 6.0);
    tc.add_hold_clock_constraint(clk, clk, 0.0);
    let mut delays = EdgeDelays::new(g.edge_count());
    for (i, e) in g.edges().enumerate() {
        delays.set_delay(e, Delay::new(0.25 * (i + 1) as f64, 0.5 * (i + 1) as f64));
    }

    let mut g2 = g.clone();
    let node_map = g2.optimize_node_layout().unwrap();
    let edge_map = g2.optimize_edge_layout().unwrap();
    g2.validate().unwrap();
    let mut tc2 = tc.clone();
    tc2.remap_nodes(&node_map);
    let mut delays2 = delays.clone();
    delays2.remap(&edge_map);

    let mut before = FullAnalyzer::new(&g, &tc, AnalyzerConfig::default()).unwrap();
    before.update_timing(&delays);
    let mut after = FullAnalyzer::new(&g2, &tc2, AnalyzerConfig::default()).unwrap();
    after.update_timing(&delays2);

    for (old, new) in node_map.iter() {
        assert_eq!(g.node_type(old), g2.node_type(new));
        assert_eq!(g.node_domain(old), g2.node_domain(new));
        assert_eq!(before.setup_node_tags(old), after.setup_node_tags(new));
        assert_eq!(before.hold_node_tags(old), after.hold_node_tags(new));
    }
    for (old, new) in edge_map.iter() {
        assert_eq!(
            node_map.get(g.edge_src(old)),
            g2.edge_src(new),
            "edge {old} moved to {new}"
        );
        assert_eq!(before.setup_edge_slacks(old), after.setup_edge_slacks(new));
        assert_eq!(before.hold_edge_slacks(old), after.hold_edge_slacks(new));
    }
    assert_eq!(before.critical_path_delay(), after.critical_path_delay());
}
