//! Level-contiguous storage layout for the timing graph.
//!
//! Traversals walk the graph level by level. Permuting node and edge storage
//! into that order keeps each level's data adjacent in memory. Both
//! operations return the old→new handle mapping so that collaborators holding
//! handles (constraints, delay tables) can follow the move.

use crate::error::GraphError;
use crate::graph::TimingGraph;
use crate::ids::{ArenaId, EdgeId, NodeId};

/// An old→new handle mapping produced by a layout optimization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remap<I> {
    old_to_new: Vec<I>,
}

impl<I: ArenaId> Remap<I> {
    fn from_new_order(new_order: &[I]) -> Self {
        let mut old_to_new = vec![I::from_index(0); new_order.len()];
        for (new_index, &old) in new_order.iter().enumerate() {
            old_to_new[old.index()] = I::from_index(new_index);
        }
        Self { old_to_new }
    }

    /// Returns the new handle of `old`.
    pub fn get(&self, old: I) -> I {
        self.old_to_new[old.index()]
    }

    /// Returns the number of mapped handles.
    pub fn len(&self) -> usize {
        self.old_to_new.len()
    }

    /// Returns `true` if the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.old_to_new.is_empty()
    }

    /// Iterates over `(old, new)` pairs in old-handle order.
    pub fn iter(&self) -> impl Iterator<Item = (I, I)> + '_ {
        self.old_to_new
            .iter()
            .enumerate()
            .map(|(old, &new)| (I::from_index(old), new))
    }

    /// Reorders a handle-indexed table into the new handle order.
    pub fn permute<T>(&self, table: Vec<T>) -> Vec<T> {
        debug_assert_eq!(table.len(), self.old_to_new.len(), "table/remap size mismatch");
        let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(table.len()).collect();
        for (old, value) in table.into_iter().enumerate() {
            slots[self.old_to_new[old].index()] = Some(value);
        }
        slots.into_iter().flatten().collect()
    }
}

impl TimingGraph {
    /// Renumbers edges so that the out-edges of each level's nodes are
    /// contiguous, in level order.
    pub fn optimize_edge_layout(&mut self) -> Result<Remap<EdgeId>, GraphError> {
        if !self.levelized {
            return Err(GraphError::NotLevelized);
        }

        let mut new_order = Vec::with_capacity(self.edges.len());
        for bucket in &self.levels {
            for &node in bucket {
                new_order.extend_from_slice(&self.node_out_edges[node.index()]);
            }
        }
        let remap = Remap::from_new_order(&new_order);

        self.edges = remap.permute(std::mem::take(&mut self.edges));
        for edges in self
            .node_in_edges
            .iter_mut()
            .chain(self.node_out_edges.iter_mut())
        {
            for edge in edges.iter_mut() {
                *edge = remap.get(*edge);
            }
        }
        Ok(remap)
    }

    /// Renumbers nodes in level order so that every level occupies a
    /// contiguous handle range.
    pub fn optimize_node_layout(&mut self) -> Result<Remap<NodeId>, GraphError> {
        if !self.levelized {
            return Err(GraphError::NotLevelized);
        }

        let new_order: Vec<NodeId> = self.levels.concat();
        let remap = Remap::from_new_order(&new_order);

        self.nodes = remap.permute(std::mem::take(&mut self.nodes));
        self.node_in_edges = remap.permute(std::mem::take(&mut self.node_in_edges));
        self.node_out_edges = remap.permute(std::mem::take(&mut self.node_out_edges));
        for edge in &mut self.edges {
            edge.src = remap.get(edge.src);
            edge.sink = remap.get(edge.sink);
        }
        for node in self.levels.iter_mut().flatten() {
            *node = remap.get(*node);
        }
        for node in &mut self.primary_outputs {
            *node = remap.get(*node);
        }
        Ok(remap)
    }
}
