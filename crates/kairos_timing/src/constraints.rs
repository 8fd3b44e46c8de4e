//! Timing constraints: clock domains, domain-pair setup/hold constraints and
//! per-node input/output delays.
//!
//! Constraints are built by an external loader, validated once against the
//! timing graph, and then read-only for the whole analysis.

use crate::error::ConstraintError;
use crate::graph::TimingGraph;
use crate::ids::{DomainId, NodeId};
use crate::layout::Remap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A collection of timing constraints for a design.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingConstraints {
    domain_names: Vec<String>,
    setup: Vec<ClockConstraint>,
    hold: Vec<ClockConstraint>,
    input: HashMap<NodeId, f64>,
    output: HashMap<NodeId, f64>,
}

/// A constraint between a launching and a capturing clock domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockConstraint {
    /// The domain launching the data.
    pub launch: DomainId,
    /// The domain capturing the data.
    pub capture: DomainId,
    /// The constraint value in nanoseconds (typically the clock period for
    /// setup and zero for hold).
    pub value_ns: f64,
}

impl TimingConstraints {
    /// Creates an empty set of timing constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock domain and returns its handle. Creating a domain with
    /// an existing name returns the existing handle.
    pub fn create_clock_domain(&mut self, name: impl Into<String>) -> DomainId {
        let name = name.into();
        if let Some(domain) = self.find_clock_domain(&name) {
            return domain;
        }
        self.domain_names.push(name);
        DomainId::from_index(self.domain_names.len() - 1)
    }

    /// Returns the domain with the given name, if any.
    pub fn find_clock_domain(&self, name: &str) -> Option<DomainId> {
        self.domain_names
            .iter()
            .position(|n| n == name)
            .map(DomainId::from_index)
    }

    /// Returns the name of a domain.
    pub fn clock_domain_name(&self, domain: DomainId) -> Option<&str> {
        self.domain_names.get(domain.index()).map(String::as_str)
    }

    /// Iterates over all domain handles.
    pub fn clock_domains(&self) -> impl ExactSizeIterator<Item = DomainId> + '_ {
        (0..self.domain_names.len()).map(DomainId::from_index)
    }

    /// Sets the setup constraint between two domains, replacing any previous value.
    pub fn add_setup_clock_constraint(&mut self, launch: DomainId, capture: DomainId, value_ns: f64) {
        upsert(&mut self.setup, launch, capture, value_ns);
    }

    /// Sets the hold constraint between two domains, replacing any previous value.
    pub fn add_hold_clock_constraint(&mut self, launch: DomainId, capture: DomainId, value_ns: f64) {
        upsert(&mut self.hold, launch, capture, value_ns);
    }

    /// Sets the input delay of a startpoint node.
    pub fn add_input_constraint(&mut self, node: NodeId, delay_ns: f64) {
        self.input.insert(node, delay_ns);
    }

    /// Sets the output delay of an endpoint node.
    pub fn add_output_constraint(&mut self, node: NodeId, delay_ns: f64) {
        self.output.insert(node, delay_ns);
    }

    /// Returns the setup constraint for a domain pair.
    pub fn setup_constraint(&self, launch: DomainId, capture: DomainId) -> Option<f64> {
        lookup(&self.setup, launch, capture)
    }

    /// Returns the hold constraint for a domain pair.
    pub fn hold_constraint(&self, launch: DomainId, capture: DomainId) -> Option<f64> {
        lookup(&self.hold, launch, capture)
    }

    /// Returns the input delay of a node.
    pub fn input_constraint(&self, node: NodeId) -> Option<f64> {
        self.input.get(&node).copied()
    }

    /// Returns the output delay of a node.
    pub fn output_constraint(&self, node: NodeId) -> Option<f64> {
        self.output.get(&node).copied()
    }

    /// Returns all setup constraints.
    pub fn setup_constraints(&self) -> &[ClockConstraint] {
        &self.setup
    }

    /// Returns all hold constraints.
    pub fn hold_constraints(&self) -> &[ClockConstraint] {
        &self.hold
    }

    /// Returns whether paths from `launch` to `capture` are constrained at all.
    pub fn should_analyze(&self, launch: DomainId, capture: DomainId) -> bool {
        self.setup_constraint(launch, capture).is_some()
            || self.hold_constraint(launch, capture).is_some()
    }

    /// Validates the constraints against a graph.
    ///
    /// Every domain carried by a node must exist, every domain referenced by
    /// a constraint must be used by at least one node, and I/O constraints
    /// must target existing nodes that belong to a domain.
    pub fn validate(&self, graph: &TimingGraph) -> Result<(), ConstraintError> {
        let mut used = vec![false; self.domain_names.len()];
        for node in graph.nodes() {
            if let Some(domain) = graph.node_domain(node) {
                match used.get_mut(domain.index()) {
                    Some(slot) => *slot = true,
                    None => return Err(ConstraintError::UnknownDomain { domain }),
                }
            }
        }

        let referenced = self
            .setup
            .iter()
            .chain(&self.hold)
            .flat_map(|c| [c.launch, c.capture]);
        for domain in referenced {
            match used.get(domain.index()) {
                None => return Err(ConstraintError::UnknownDomain { domain }),
                Some(false) => {
                    return Err(ConstraintError::UnusedDomain {
                        domain,
                        name: self.domain_names[domain.index()].clone(),
                    })
                }
                Some(true) => {}
            }
        }

        for &node in self.input.keys().chain(self.output.keys()) {
            if node.index() >= graph.node_count() {
                return Err(ConstraintError::UnknownNode { node });
            }
            if graph.node_domain(node).is_none() {
                return Err(ConstraintError::NodeWithoutDomain { node });
            }
        }
        Ok(())
    }

    /// Rewrites node handles after a node layout optimization.
    pub fn remap_nodes(&mut self, remap: &Remap<NodeId>) {
        let remap_keys = |table: HashMap<NodeId, f64>| -> HashMap<NodeId, f64> {
            table
                .into_iter()
                .map(|(node, delay)| (remap.get(node), delay))
                .collect()
        };
        self.input = remap_keys(std::mem::take(&mut self.input));
        self.output = remap_keys(std::mem::take(&mut self.output));
    }
}

fn upsert(list: &mut Vec<ClockConstraint>, launch: DomainId, capture: DomainId, value_ns: f64) {
    match list
        .iter_mut()
        .find(|c| c.launch == launch && c.capture == capture)
    {
        Some(existing) => existing.value_ns = value_ns,
        None => list.push(ClockConstraint {
            launch,
            capture,
            value_ns,
        }),
    }
}

fn lookup(list: &[ClockConstraint], launch: DomainId, capture: DomainId) -> Option<f64> {
    list.iter()
        .find(|c| c.launch == launch && c.capture == capture)
        .map(|c| c.value_ns)
}
