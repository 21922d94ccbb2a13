//! Search nodes and the bookkeeping structures over them.

mod ad_node;
mod consistency_sets;
mod node_store;

pub use ad_node::{AdNode, BackPointer};
pub use consistency_sets::ConsistencySets;
pub use node_store::NodeStore;

use std::cmp::Ordering;

/// Membership of a node in the consistency sets.
///
/// `Incons` implies that the node was expanded in the current episode,
/// i.e., it is still closed but no longer consistent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Membership {
    /// Not visited yet, or settled in a previous episode.
    #[default]
    None,
    /// Candidate for expansion.
    Open,
    /// Expanded in the current episode and locally consistent.
    Closed,
    /// Expanded in the current episode but made inconsistent afterwards.
    Incons,
}

/// Two-level priority of a node. Smaller is better.
#[derive(Clone, Copy, Debug)]
pub struct NodeKey<C> {
    primary: C,
    secondary: C,
}

impl<C> NodeKey<C> {
    pub fn new(primary: C, secondary: C) -> Self {
        Self { primary, secondary }
    }
}

fn total_cmp<T: PartialOrd>(a: &T, b: &T) -> Ordering {
    if a < b {
        Ordering::Less
    } else if a > b {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

impl<C: PartialOrd> PartialEq for NodeKey<C> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<C: PartialOrd> Eq for NodeKey<C> {}

impl<C: PartialOrd> Ord for NodeKey<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        total_cmp(&self.primary, &other.primary)
            .then_with(|| total_cmp(&self.secondary, &other.secondary))
    }
}

impl<C: PartialOrd> PartialOrd for NodeKey<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
