//! Anytime Dynamic A* (AD*).
//!
//! An incremental heuristic search engine over a graph defined implicitly by transition,
//! cost, and heuristic functions.
//! The first solution is found quickly with an inflated heuristic and improved as the inflation
//! is lowered, and edge cost changes are repaired by reusing the previous search effort.

mod error;
mod model;
pub mod solvers;
pub mod timer;

pub use error::{Result, SearchError};
pub use model::{CostFunction, HeuristicFunction, Transition, TransitionFunction, ZeroHeuristic};
pub use solvers::Solution;

pub mod prelude {
    pub use super::solvers::{AdStarSearch, Phase, Search, SearchParameters};
    pub use super::{
        CostFunction, HeuristicFunction, SearchError, Solution, Transition, TransitionFunction,
        ZeroHeuristic,
    };
}
