//! Analyzer profiling counters.

use crate::analyzer::AnalysisMode;
use crate::walker::WalkStats;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cumulative and last-update profiling counters of an analyzer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilingData {
    /// Wall-clock seconds spent in all updates.
    pub total_analysis_sec: f64,
    /// Wall-clock seconds spent in the last update.
    pub analysis_sec: f64,
    /// Number of updates that ran the full walker.
    pub num_full_updates: u64,
    /// Number of updates that ran the incremental walker.
    pub num_incr_updates: u64,
    /// Nodes visited by the arrival traversal of the last update.
    pub arrival_traversed_nodes: u64,
    /// Nodes visited by the required traversal of the last update.
    pub required_traversed_nodes: u64,
    /// Nodes whose slack was recomputed by the last update.
    pub slack_traversed_nodes: u64,
}

impl ProfilingData {
    /// Names accepted by [`get`](Self::get).
    pub const KEYS: [&'static str; 7] = [
        "total_analysis_sec",
        "analysis_sec",
        "num_full_updates",
        "num_incr_updates",
        "arrival_traversed_nodes",
        "required_traversed_nodes",
        "slack_traversed_nodes",
    ];

    /// Looks a counter up by name.
    pub fn get(&self, key: &str) -> Option<f64> {
        let value = match key {
            "total_analysis_sec" => self.total_analysis_sec,
            "analysis_sec" => self.analysis_sec,
            "num_full_updates" => self.num_full_updates as f64,
            "num_incr_updates" => self.num_incr_updates as f64,
            "arrival_traversed_nodes" => self.arrival_traversed_nodes as f64,
            "required_traversed_nodes" => self.required_traversed_nodes as f64,
            "slack_traversed_nodes" => self.slack_traversed_nodes as f64,
            _ => return None,
        };
        Some(value)
    }

    pub(crate) fn record(&mut self, mode: AnalysisMode, elapsed: Duration, stats: &WalkStats) {
        let secs = elapsed.as_secs_f64();
        self.analysis_sec = secs;
        self.total_analysis_sec += secs;
        match mode {
            AnalysisMode::Full => self.num_full_updates += 1,
            AnalysisMode::Incremental => self.num_incr_updates += 1,
        }
        self.arrival_traversed_nodes = stats.arrival_nodes as u64;
        self.required_traversed_nodes = stats.required_nodes as u64;
        self.slack_traversed_nodes = stats.slack_nodes as u64;
    }
}
