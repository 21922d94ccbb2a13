use crate::error::{Result, SearchError};
use num_traits::Float;
use std::fmt::Display;

/// Search parameters.
#[derive(Clone, Debug)]
pub struct SearchParameters<C> {
    /// Suboptimality factor of the first episode. One if `None`.
    pub initial_epsilon: Option<C>,
    /// Suboptimality factor at which the anytime loop stops improving. One if `None`.
    pub final_epsilon: Option<C>,
    /// Amount by which the anytime loop lowers epsilon after each converged episode.
    /// 0.5 if `None`.
    pub epsilon_decrement: Option<C>,
    /// Time limit in seconds.
    pub time_limit: Option<f64>,
    /// Maximum number of nodes to expand.
    pub expansion_limit: Option<usize>,
    /// Initial capacity of the node store.
    pub initial_registry_capacity: Option<usize>,
}

impl<C> Default for SearchParameters<C> {
    fn default() -> Self {
        Self {
            initial_epsilon: None,
            final_epsilon: None,
            epsilon_decrement: None,
            time_limit: None,
            expansion_limit: None,
            initial_registry_capacity: None,
        }
    }
}

impl<C> SearchParameters<C>
where
    C: Float + Display,
{
    /// Returns the initial epsilon.
    pub fn get_initial_epsilon(&self) -> C {
        self.initial_epsilon.unwrap_or_else(C::one)
    }

    /// Returns the final epsilon.
    pub fn get_final_epsilon(&self) -> C {
        self.final_epsilon.unwrap_or_else(C::one)
    }

    /// Returns the epsilon decrement.
    pub fn get_epsilon_decrement(&self) -> C {
        self.epsilon_decrement
            .unwrap_or_else(|| C::one() / (C::one() + C::one()))
    }

    /// Checks that the parameters are consistent.
    pub fn validate(&self) -> Result<()> {
        let initial = self.get_initial_epsilon();
        let last = self.get_final_epsilon();
        let decrement = self.get_epsilon_decrement();

        if !(initial >= C::one()) || !initial.is_finite() {
            return Err(SearchError::InvalidParameter(format!(
                "initial epsilon must be finite and at least one, got {initial}"
            )));
        }

        if !(last >= C::one()) || last > initial {
            return Err(SearchError::InvalidParameter(format!(
                "final epsilon must be between one and the initial epsilon {initial}, got {last}"
            )));
        }

        if !(decrement > C::zero()) {
            return Err(SearchError::InvalidParameter(format!(
                "epsilon decrement must be positive, got {decrement}"
            )));
        }

        if self.time_limit.is_some_and(|limit| !(limit >= 0.0)) {
            return Err(SearchError::InvalidParameter(
                "time limit must be non-negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Solution information.
#[derive(Clone, PartialEq, Debug)]
pub struct Solution<S, C> {
    /// Cost-to-come of the goal, or `None` if no path is known.
    ///
    /// Once the episode has converged, `cost` is at most `epsilon` times the optimal cost.
    /// With `epsilon` above one, `path` can be cheaper than `cost`.
    pub cost: Option<C>,
    /// States from the start to the goal.
    pub path: Vec<S>,
    /// Suboptimality factor the solution is proved for, or `None` if the episode was interrupted.
    pub epsilon: Option<C>,
    /// Whether the solution is optimal.
    pub is_optimal: bool,
    /// Whether no goal is reachable.
    pub is_infeasible: bool,
    /// Number of nodes expanded.
    pub expanded: usize,
    /// Number of nodes generated.
    pub generated: usize,
    /// Elapsed time in seconds.
    pub time: f64,
    /// Whether the time limit is reached.
    pub is_time_limit_reached: bool,
    /// Whether the expansion limit is reached.
    pub is_expansion_limit_reached: bool,
}

impl<S, C> Default for Solution<S, C> {
    fn default() -> Self {
        Self {
            cost: None,
            path: Vec::new(),
            epsilon: None,
            is_optimal: false,
            is_infeasible: false,
            expanded: 0,
            generated: 0,
            time: 0.0,
            is_time_limit_reached: false,
            is_expansion_limit_reached: false,
        }
    }
}

/// Search trait.
pub trait Search {
    type State;
    type CostType;

    /// Searches for the next solution.
    ///
    /// The second return value indicates whether the search is terminated.
    fn search_next(&mut self) -> Result<(Solution<Self::State, Self::CostType>, bool)>;

    /// Performs search until termination.
    fn search(&mut self) -> Result<Solution<Self::State, Self::CostType>> {
        loop {
            let (solution, terminated) = self.search_next()?;

            if terminated {
                return Ok(solution);
            }
        }
    }
}
