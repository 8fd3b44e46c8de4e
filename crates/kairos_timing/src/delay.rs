//! Edge delay contract consumed by the analysis.
//!
//! The analysis never guesses a delay: it asks a [`DelayCalculator`] for every
//! edge it traverses. Values must stay stable for the duration of one update;
//! a caller that changes a delay must invalidate the edge before the next
//! update.

use crate::ids::EdgeId;
use crate::layout::Remap;
use serde::{Deserialize, Serialize};

/// Source of edge delays for timing analysis.
pub trait DelayCalculator {
    /// Returns the slow-corner delay of an edge, used by setup analysis.
    fn max_edge_delay(&self, edge: EdgeId) -> f64;

    /// Returns the fast-corner delay of an edge, used by hold analysis.
    fn min_edge_delay(&self, edge: EdgeId) -> f64;

    /// Returns the setup time of a clock-capture edge.
    fn setup_time(&self, _edge: EdgeId) -> f64 {
        0.0
    }

    /// Returns the hold time of a clock-capture edge.
    fn hold_time(&self, _edge: EdgeId) -> f64 {
        0.0
    }
}

/// A min/max delay pair in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Delay {
    /// Minimum delay in nanoseconds (fast corner).
    pub min_ns: f64,
    /// Maximum delay in nanoseconds (slow corner).
    pub max_ns: f64,
}

impl Delay {
    /// A zero delay (no propagation time).
    pub const ZERO: Self = Self {
        min_ns: 0.0,
        max_ns: 0.0,
    };

    /// Creates a new delay with the given min/max values.
    pub fn new(min_ns: f64, max_ns: f64) -> Self {
        Self { min_ns, max_ns }
    }

    /// Creates a delay whose corners coincide.
    pub fn fixed(ns: f64) -> Self {
        Self::new(ns, ns)
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::ZERO
    }
}

/// A table-backed [`DelayCalculator`] holding one entry per edge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeDelays {
    delays: Vec<Delay>,
    setup_times: Vec<f64>,
    hold_times: Vec<f64>,
}

impl EdgeDelays {
    /// Creates a table of `edge_count` zero delays.
    pub fn new(edge_count: usize) -> Self {
        Self {
            delays: vec![Delay::ZERO; edge_count],
            setup_times: vec![0.0; edge_count],
            hold_times: vec![0.0; edge_count],
        }
    }

    /// Creates a table where every edge has the same delay.
    pub fn uniform(edge_count: usize, delay: Delay) -> Self {
        Self {
            delays: vec![delay; edge_count],
            ..Self::new(edge_count)
        }
    }

    /// Returns the delay of an edge.
    pub fn delay(&self, edge: EdgeId) -> Delay {
        self.delays[edge.index()]
    }

    /// Sets the delay of an edge. The caller is responsible for invalidating
    /// the edge in any analyzer that has already used the old value.
    pub fn set_delay(&mut self, edge: EdgeId, delay: Delay) {
        self.delays[edge.index()] = delay;
    }

    /// Sets the setup and hold times of a clock-capture edge.
    pub fn set_check_times(&mut self, edge: EdgeId, setup_ns: f64, hold_ns: f64) {
        self.setup_times[edge.index()] = setup_ns;
        self.hold_times[edge.index()] = hold_ns;
    }

    /// Reorders the table after an edge layout optimization.
    pub fn remap(&mut self, remap: &Remap<EdgeId>) {
        self.delays = remap.permute(std::mem::take(&mut self.delays));
        self.setup_times = remap.permute(std::mem::take(&mut self.setup_times));
        self.hold_times = remap.permute(std::mem::take(&mut self.hold_times));
    }
}

impl DelayCalculator for EdgeDelays {
    fn max_edge_delay(&self, edge: EdgeId) -> f64 {
        self.delays[edge.index()].max_ns
    }

    fn min_edge_delay(&self, edge: EdgeId) -> f64 {
        self.delays[edge.index()].min_ns
    }

    fn setup_time(&self, edge: EdgeId) -> f64 {
        self.setup_times[edge.index()]
    }

    fn hold_time(&self, edge: EdgeId) -> f64 {
        self.hold_times[edge.index()]
    }
}
