//! Incremental heuristic search algorithms.

mod adstar_search;
mod search;
mod search_nodes;

pub use adstar_search::{AdStarSearch, Consistency, ExpandedNode, ExpansionResult, Phase};
pub use search::{Search, SearchParameters, Solution};
pub use search_nodes::{AdNode, BackPointer, ConsistencySets, Membership, NodeKey, NodeStore};
