//! Timing tags: per-domain time values attached to nodes and edges.
//!
//! A [`TagList`] holds at most one tag per clock domain and keeps its tags
//! sorted by domain, so two lists describing the same timing compare equal no
//! matter in which order their tags were produced.

use crate::ids::{DomainId, NodeId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// A single time value for one clock domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingTag {
    /// Time in nanoseconds.
    pub time: f64,
    /// The clock domain the time belongs to (the launch domain for data tags).
    pub domain: DomainId,
    /// The neighbouring node that determined the value, or `None` for seeded
    /// tags (startpoints and endpoint checks).
    pub origin: Option<NodeId>,
}

impl TimingTag {
    /// Creates a tag.
    pub fn new(time: f64, domain: DomainId, origin: Option<NodeId>) -> Self {
        Self {
            time,
            domain,
            origin,
        }
    }
}

/// The role of a tag on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagKind {
    /// Time at which data launched from a domain arrives.
    DataArrival,
    /// Time by which data launched from a domain must arrive.
    DataRequired,
    /// Arrival of a clock edge that launches data.
    ClockLaunch,
    /// Arrival of a clock edge that captures data.
    ClockCapture,
    /// Slack of the node, per launch domain.
    Slack,
}

impl TagKind {
    /// Every kind, in storage order.
    pub const ALL: [TagKind; 5] = [
        TagKind::DataArrival,
        TagKind::DataRequired,
        TagKind::ClockLaunch,
        TagKind::ClockCapture,
        TagKind::Slack,
    ];

    fn slot(self) -> usize {
        match self {
            TagKind::DataArrival => 0,
            TagKind::DataRequired => 1,
            TagKind::ClockLaunch => 2,
            TagKind::ClockCapture => 3,
            TagKind::Slack => 4,
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TagKind::DataArrival => "data arrival",
            TagKind::DataRequired => "data required",
            TagKind::ClockLaunch => "clock launch",
            TagKind::ClockCapture => "clock capture",
            TagKind::Slack => "slack",
        };
        f.write_str(name)
    }
}

/// Domain-sorted list of tags with at most one tag per domain.
///
/// Equality compares domains and the bit patterns of the times; origins are
/// bookkeeping and do not take part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagList {
    tags: SmallVec<[TimingTag; 1]>,
}

impl TagList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns `true` if the list holds no tags.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterates over the tags in domain order.
    pub fn iter(&self) -> std::slice::Iter<'_, TimingTag> {
        self.tags.iter()
    }

    /// Returns the tag of a domain.
    pub fn get(&self, domain: DomainId) -> Option<&TimingTag> {
        self.position(domain).ok().map(|i| &self.tags[i])
    }

    /// Returns the time of a domain's tag.
    pub fn time(&self, domain: DomainId) -> Option<f64> {
        self.get(domain).map(|tag| tag.time)
    }

    /// Inserts `tag`, or replaces the tag of the same domain when
    /// `wins(new_time, old_time)` holds.
    pub(crate) fn merge(&mut self, tag: TimingTag, wins: impl Fn(f64, f64) -> bool) {
        match self.position(tag.domain) {
            Ok(i) => {
                if wins(tag.time, self.tags[i].time) {
                    self.tags[i] = tag;
                }
            }
            Err(i) => self.tags.insert(i, tag),
        }
    }

    /// Inserts `tag`, replacing any tag of the same domain.
    pub(crate) fn set(&mut self, tag: TimingTag) {
        self.merge(tag, |_, _| true);
    }

    /// Drops every tag determined by `origin`.
    pub(crate) fn remove_origin(&mut self, origin: NodeId) {
        self.tags.retain(|tag| tag.origin != Some(origin));
    }

    pub(crate) fn clear(&mut self) {
        self.tags.clear();
    }

    fn position(&self, domain: DomainId) -> Result<usize, usize> {
        self.tags.binary_search_by_key(&domain, |tag| tag.domain)
    }
}

impl PartialEq for TagList {
    fn eq(&self, other: &Self) -> bool {
        self.tags.len() == other.tags.len()
            && self
                .tags
                .iter()
                .zip(&other.tags)
                .all(|(a, b)| a.domain == b.domain && a.time.to_bits() == b.time.to_bits())
    }
}

impl<'a> IntoIterator for &'a TagList {
    type Item = &'a TimingTag;
    type IntoIter = std::slice::Iter<'a, TimingTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

/// All tags of one node for one analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeTags {
    lists: [TagList; 5],
}

impl NodeTags {
    /// Returns the list of one kind.
    pub fn get(&self, kind: TagKind) -> &TagList {
        &self.lists[kind.slot()]
    }

    pub(crate) fn get_mut(&mut self, kind: TagKind) -> &mut TagList {
        &mut self.lists[kind.slot()]
    }

    /// Returns `true` if no list holds a tag.
    pub fn is_empty(&self) -> bool {
        self.lists.iter().all(TagList::is_empty)
    }

    pub(crate) fn clear(&mut self) {
        for list in &mut self.lists {
            list.clear();
        }
    }
}
