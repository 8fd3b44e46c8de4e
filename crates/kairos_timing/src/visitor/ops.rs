//! Setup/hold specific arithmetic plugged into the common visitor.

use crate::constraints::TimingConstraints;
use crate::delay::DelayCalculator;
use crate::ids::{DomainId, EdgeId};

/// Operations that distinguish one analysis (setup or hold) from the other.
pub trait AnalysisOps {
    /// Short name used in logs.
    const NAME: &'static str;

    /// Delay of an edge for this analysis.
    fn edge_delay(delays: &dyn DelayCalculator, edge: EdgeId) -> f64;

    /// Adjustment applied to a capture clock crossing a clock-capture edge.
    fn capture_offset(delays: &dyn DelayCalculator, edge: EdgeId) -> f64;

    /// Whether a new arrival or launch time replaces the current one.
    fn arrival_wins(new: f64, old: f64) -> bool;

    /// Whether a new required or capture time replaces the current one.
    fn required_wins(new: f64, old: f64) -> bool;

    /// The domain-pair constraint used by this analysis.
    fn clock_constraint(
        constraints: &TimingConstraints,
        launch: DomainId,
        capture: DomainId,
    ) -> Option<f64>;

    /// Slack of an arrival against a required time. Negative means violated.
    fn slack(arrival: f64, required: f64) -> f64;
}

/// Setup (max-delay) analysis: latest arrival against earliest capture.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetupOps;

impl AnalysisOps for SetupOps {
    const NAME: &'static str = "setup";

    fn edge_delay(delays: &dyn DelayCalculator, edge: EdgeId) -> f64 {
        delays.max_edge_delay(edge)
    }

    fn capture_offset(delays: &dyn DelayCalculator, edge: EdgeId) -> f64 {
        -delays.setup_time(edge)
    }

    fn arrival_wins(new: f64, old: f64) -> bool {
        new > old
    }

    fn required_wins(new: f64, old: f64) -> bool {
        new < old
    }

    fn clock_constraint(
        constraints: &TimingConstraints,
        launch: DomainId,
        capture: DomainId,
    ) -> Option<f64> {
        constraints.setup_constraint(launch, capture)
    }

    fn slack(arrival: f64, required: f64) -> f64 {
        required - arrival
    }
}

/// Hold (min-delay) analysis: earliest arrival against latest capture.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoldOps;

impl AnalysisOps for HoldOps {
    const NAME: &'static str = "hold";

    fn edge_delay(delays: &dyn DelayCalculator, edge: EdgeId) -> f64 {
        delays.min_edge_delay(edge)
    }

    fn capture_offset(delays: &dyn DelayCalculator, edge: EdgeId) -> f64 {
        delays.hold_time(edge)
    }

    fn arrival_wins(new: f64, old: f64) -> bool {
        new < old
    }

    fn required_wins(new: f64, old: f64) -> bool {
        new > old
    }

    fn clock_constraint(
        constraints: &TimingConstraints,
        launch: DomainId,
        capture: DomainId,
    ) -> Option<f64> {
        constraints.hold_constraint(launch, capture)
    }

    fn slack(arrival: f64, required: f64) -> f64 {
        arrival - required
    }
}
