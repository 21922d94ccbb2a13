use num_traits::ToPrimitive;
use thiserror::Error;

/// Errors raised by the search.
///
/// A failing operation leaves the search in the state it had before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// No path to the requested state is known under the current edge costs.
    #[error("no path to the requested state is known")]
    UnreachableGoal,

    /// Epsilon was raised, or set below one.
    #[error("epsilon must satisfy 1 <= requested <= current (current: {current}, requested: {requested})")]
    InvalidEpsilon { current: f64, requested: f64 },

    /// The cost function returned a negative cost.
    #[error("negative transition cost: {cost}")]
    NegativeCost { cost: f64 },

    /// The cost function returned NaN or an infinite cost.
    #[error("non-finite transition cost: {cost}")]
    NonFiniteCost { cost: f64 },

    /// The heuristic function returned a negative or non-finite estimate.
    #[error("invalid heuristic estimate: {value}")]
    InvalidHeuristic { value: f64 },

    /// The forward and reverse transition functions disagree about adjacency.
    #[error("the predecessor function does not report an edge implied by the successor function")]
    InconsistentCollaborator,

    /// A search parameter is out of its domain.
    #[error("invalid search parameter: {0}")]
    InvalidParameter(String),
}

/// Result type of the search.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Converts a cost value for error reporting.
pub(crate) fn to_f64<C: ToPrimitive>(value: C) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}
