//! Per-level work queue used by the incremental walker.

use crate::ids::{LevelId, NodeId};

/// Nodes awaiting a visit, bucketed by level, each node queued at most once.
#[derive(Debug, Clone)]
pub(crate) struct LevelQueue {
    buckets: Vec<Vec<NodeId>>,
    queued: Vec<bool>,
    len: usize,
    min_level: usize,
    max_level: usize,
}

impl LevelQueue {
    pub(crate) fn new(node_count: usize, level_count: usize) -> Self {
        Self {
            buckets: vec![Vec::new(); level_count],
            queued: vec![false; node_count],
            len: 0,
            min_level: usize::MAX,
            max_level: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Queues `node` at `level`. Returns `false` if it was already queued.
    pub(crate) fn push(&mut self, node: NodeId, level: LevelId) -> bool {
        let queued = &mut self.queued[node.index()];
        if *queued {
            return false;
        }
        *queued = true;
        let level = level.index();
        self.buckets[level].push(node);
        self.min_level = self.min_level.min(level);
        self.max_level = self.max_level.max(level);
        self.len += 1;
        true
    }

    /// Moves the lowest non-empty bucket into `out`.
    pub(crate) fn take_lowest(&mut self, out: &mut Vec<NodeId>) -> Option<LevelId> {
        if self.is_empty() {
            return None;
        }
        let level = (self.min_level..=self.max_level).find(|&l| !self.buckets[l].is_empty())?;
        self.min_level = level + 1;
        Some(self.take_bucket(level, out))
    }

    /// Moves the highest non-empty bucket into `out`.
    pub(crate) fn take_highest(&mut self, out: &mut Vec<NodeId>) -> Option<LevelId> {
        if self.is_empty() {
            return None;
        }
        let level = (self.min_level..=self.max_level)
            .rev()
            .find(|&l| !self.buckets[l].is_empty())?;
        self.max_level = level.saturating_sub(1);
        Some(self.take_bucket(level, out))
    }

    fn take_bucket(&mut self, level: usize, out: &mut Vec<NodeId>) -> LevelId {
        out.clear();
        std::mem::swap(out, &mut self.buckets[level]);
        for node in out.iter() {
            self.queued[node.index()] = false;
        }
        self.len -= out.len();
        if self.len == 0 {
            self.min_level = usize::MAX;
            self.max_level = 0;
        }
        LevelId::from_index(level)
    }

    pub(crate) fn clear(&mut self) {
        for bucket in &mut self.buckets {
            for node in bucket.drain(..) {
                self.queued[node.index()] = false;
            }
        }
        self.len = 0;
        self.min_level = usize::MAX;
        self.max_level = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(i: u32) -> NodeId {
        NodeId::from_raw(i)
    }

    fn l(i: u32) -> LevelId {
        LevelId::from_raw(i)
    }

    #[test]
    fn nodes_are_queued_once() {
        let mut q = LevelQueue::new(4, 3);
        assert!(q.push(n(1), l(2)));
        assert!(!q.push(n(1), l(2)));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn ascending_drain_sees_later_pushes() {
        let mut q = LevelQueue::new(5, 4);
        q.push(n(2), l(1));
        q.push(n(0), l(0));
        let mut out = Vec::new();
        assert_eq!(q.take_lowest(&mut out), Some(l(0)));
        assert_eq!(out, vec![n(0)]);
        q.push(n(4), l(3));
        assert_eq!(q.take_lowest(&mut out), Some(l(1)));
        assert_eq!(q.take_lowest(&mut out), Some(l(3)));
        assert_eq!(out, vec![n(4)]);
        assert_eq!(q.take_lowest(&mut out), None);
        assert!(q.is_empty());
    }

    #[test]
    fn descending_drain_sees_earlier_pushes() {
        let mut q = LevelQueue::new(5, 4);
        q.push(n(3), l(3));
        let mut out = Vec::new();
        assert_eq!(q.take_highest(&mut out), Some(l(3)));
        q.push(n(1), l(1));
        q.push(n(0), l(0));
        assert_eq!(q.take_highest(&mut out), Some(l(1)));
        assert_eq!(q.take_highest(&mut out), Some(l(0)));
        assert_eq!(q.take_highest(&mut out), None);
    }

    #[test]
    fn taken_nodes_can_be_requeued() {
        let mut q = LevelQueue::new(2, 2);
        q.push(n(1), l(1));
        let mut out = Vec::new();
        q.take_lowest(&mut out);
        assert!(q.push(n(1), l(1)));
        q.clear();
        assert!(q.is_empty());
        assert!(q.push(n(1), l(1)));
    }
}
