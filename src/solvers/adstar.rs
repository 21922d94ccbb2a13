use crate::error::Result;
use crate::model::{CostFunction, HeuristicFunction, TransitionFunction, ZeroHeuristic};
use crate::solvers::search_algorithms::AdStarSearch;
use crate::solvers::SearchParameters;
use num_traits::Float;
use std::fmt::Display;
use std::hash::Hash;

/// Creates an Anytime Dynamic A* (AD*) solver.
///
/// Nodes are ordered by the g-value plus the heuristic value inflated by epsilon,
/// so the first solution found is within a factor of `parameters.initial_epsilon` of the
/// optimal cost if the heuristic is consistent.
/// The solver implements `Search`: each call of `search_next` converges the current episode and
/// lowers epsilon by `parameters.epsilon_decrement` until `parameters.final_epsilon` is reached.
///
/// `predecessors` must report every edge `p -> s` generated by `successors` as a transition
/// from `s` to `p` with the same action.
///
/// # Examples
///
/// ```
/// use adstar::prelude::*;
/// use adstar::solvers;
///
/// let edges = vec![('a', 'b', 1.0), ('b', 'c', 1.0), ('a', 'c', 3.0)];
/// let successors = |state: &char| {
///     edges
///         .iter()
///         .filter(|(from, _, _)| from == state)
///         .map(|&(from, to, _)| Transition::new(from, to, ()))
///         .collect::<Vec<_>>()
/// };
/// let predecessors = |state: &char| {
///     edges
///         .iter()
///         .filter(|(_, to, _)| to == state)
///         .map(|&(from, to, _)| Transition::new(to, from, ()))
///         .collect::<Vec<_>>()
/// };
/// let cost = |transition: &Transition<char, ()>| {
///     edges
///         .iter()
///         .find(|(from, to, _)| Some(*from) == transition.from && *to == transition.to)
///         .map_or(f64::INFINITY, |&(_, _, weight)| weight)
/// };
/// let parameters = SearchParameters {
///     initial_epsilon: Some(2.5),
///     ..Default::default()
/// };
///
/// let mut solver = solvers::create_adstar(
///     'a',
///     ['c'],
///     successors,
///     predecessors,
///     cost,
///     |_: &char| 0.0,
///     parameters,
/// )
/// .unwrap();
/// let solution = solver.search().unwrap();
/// assert_eq!(solution.cost, Some(2.0));
/// assert_eq!(solution.path, vec!['a', 'b', 'c']);
/// assert!(solution.is_optimal);
///
/// solver
///     .notify_edge_changed(&Transition::new('b', 'c', ()), 5.0)
///     .unwrap();
/// let solution = solver.search().unwrap();
/// assert_eq!(solution.cost, Some(3.0));
/// assert_eq!(solution.path, vec!['a', 'c']);
/// ```
pub fn create_adstar<S, A, C, F, R, W, H>(
    start: S,
    goals: impl IntoIterator<Item = S>,
    successors: F,
    predecessors: R,
    cost_function: W,
    heuristic: H,
    parameters: SearchParameters<C>,
) -> Result<AdStarSearch<S, A, C, F, R, W, H>>
where
    S: Hash + Eq + Clone,
    A: Hash + Eq + Clone,
    C: Float + Display,
    F: TransitionFunction<S, A>,
    R: TransitionFunction<S, A>,
    W: CostFunction<S, A, C>,
    H: HeuristicFunction<S, C>,
{
    AdStarSearch::new(
        start,
        goals,
        successors,
        predecessors,
        cost_function,
        heuristic,
        parameters,
    )
}

/// Creates an incremental Dijkstra solver.
///
/// This is AD* without a heuristic and with epsilon fixed to one, so every solution is optimal
/// and edge changes are repaired incrementally.
pub fn create_incremental_dijkstra<S, A, C, F, R, W>(
    start: S,
    goals: impl IntoIterator<Item = S>,
    successors: F,
    predecessors: R,
    cost_function: W,
    mut parameters: SearchParameters<C>,
) -> Result<AdStarSearch<S, A, C, F, R, W, ZeroHeuristic>>
where
    S: Hash + Eq + Clone,
    A: Hash + Eq + Clone,
    C: Float + Display,
    F: TransitionFunction<S, A>,
    R: TransitionFunction<S, A>,
    W: CostFunction<S, A, C>,
{
    parameters.initial_epsilon = None;
    parameters.final_epsilon = None;

    AdStarSearch::new(
        start,
        goals,
        successors,
        predecessors,
        cost_function,
        ZeroHeuristic,
        parameters,
    )
}
