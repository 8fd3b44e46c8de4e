//! Incremental static timing analysis for the Kairos toolchain.
//!
//! This crate provides a levelized timing graph, clock-domain constraints and
//! an analysis engine that computes setup and hold arrival times, required
//! times and slack. After the first update, edge delay changes are absorbed
//! incrementally: only the fanout and fanin cones of the invalidated edges are
//! revisited.
//!
//! # Usage
//!
//! ```ignore
//! use kairos_timing::{AdaptiveAnalyzer, AnalyzerConfig, EdgeDelays, TimingGraph};
//!
//! graph.levelize()?;
//! let mut sta = AdaptiveAnalyzer::new(&graph, &constraints, AnalyzerConfig::default())?;
//! sta.update_timing(&delays);
//!
//! delays.set_delay(edge, Delay::new(0.4, 0.9));
//! sta.invalidate_edge(edge);
//! sta.update_timing(&delays);
//! println!("critical path: {:?} ns", sta.critical_path_delay());
//! ```
//!
//! # Architecture
//!
//! - [`graph`] — timing nodes, edges, adjacency and levelization
//! - [`layout`] — level-contiguous storage permutation
//! - [`constraints`] — clock domains, domain-pair and I/O constraints
//! - [`delay`] — the edge delay contract and a table-backed implementation
//! - [`tags`] — per-domain timing values attached to nodes and edges
//! - [`visitor`] — setup/hold propagation rules
//! - [`walker`] — full and incremental traversal strategies
//! - [`analyzer`] — the analysis API and mode selection

#![warn(missing_docs)]

pub mod analyzer;
pub mod config;
pub mod constraints;
pub mod delay;
pub mod error;
pub mod graph;
pub mod ids;
pub mod layout;
pub mod profiling;
pub mod tags;
pub mod visitor;
pub mod walker;

pub use analyzer::{
    Adaptive, AdaptiveAnalyzer, AnalysisMode, Fixed, FixedAnalyzer, FullAnalyzer, IncrAnalyzer,
    TimingAnalyzer, UpdateScope, UpdateStrategy,
};
pub use config::{load_config, load_config_from_str, AnalyzerConfig};
pub use constraints::{ClockConstraint, TimingConstraints};
pub use delay::{Delay, DelayCalculator, EdgeDelays};
pub use error::{AnalysisError, ConfigError, ConstraintError, GraphError};
pub use graph::{EdgeKind, NodeType, TimingEdge, TimingGraph, TimingNode};
pub use ids::{DomainId, EdgeId, LevelId, NodeId};
pub use layout::Remap;
pub use profiling::ProfilingData;
pub use tags::{NodeTags, TagKind, TagList, TimingTag};
pub use walker::{Coverage, FullWalker, IncrWalker, TimingWalker, WalkStats};
