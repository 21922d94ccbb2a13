use super::search::{Search, SearchParameters, Solution};
use super::search_nodes::{AdNode, BackPointer, ConsistencySets, NodeStore};
use crate::error::{Result, SearchError, to_f64};
use crate::model::{CostFunction, HeuristicFunction, Transition, TransitionFunction};
use crate::timer::Timer;
use num_traits::Float;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt::Display;
use std::hash::Hash;
use tracing::{debug, info, trace};

/// Phase of the search driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// The current episode has not converged.
    Expanding,
    /// The solution is bounded by the current epsilon, which can still be lowered.
    Converged,
    /// The solution is bounded by epsilon one; only an edge change restarts the search.
    AwaitingChange,
}

/// Consistency of a node when it was expanded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Consistency {
    /// A cheaper path was found and propagated to the successors.
    Overconsistent,
    /// The cost-to-come was invalidated and recomputed from the predecessors.
    Underconsistent,
}

/// Node processed by one step of the search.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpandedNode<S, C> {
    pub state: S,
    pub consistency: Consistency,
    /// g-value after the expansion.
    pub g: C,
    /// v-value after the expansion.
    pub v: C,
}

/// Result of one step of the search.
#[derive(Clone, Debug, PartialEq)]
pub enum ExpansionResult<S, C> {
    /// A node was expanded.
    Expanded(ExpandedNode<S, C>),
    /// The solution is bounded by the current epsilon; nothing was expanded.
    Converged,
}

struct Successor<S, A, C> {
    transition: Transition<S, A>,
    cost: C,
    h: C,
}

struct Predecessor<S, A, C> {
    transition: Transition<S, A>,
    node: Option<usize>,
    cost: C,
}

fn check_cost<C: Float>(cost: C) -> Result<C> {
    if cost.is_nan() {
        Err(SearchError::NonFiniteCost { cost: to_f64(cost) })
    } else if cost < C::zero() {
        Err(SearchError::NegativeCost { cost: to_f64(cost) })
    } else if cost.is_infinite() {
        Err(SearchError::NonFiniteCost { cost: to_f64(cost) })
    } else {
        Ok(cost)
    }
}

fn check_heuristic<C: Float>(value: C) -> Result<C> {
    if value.is_finite() && value >= C::zero() {
        Ok(value)
    } else {
        Err(SearchError::InvalidHeuristic {
            value: to_f64(value),
        })
    }
}

/// Anytime Dynamic A* (AD*).
///
/// Searches a path from the start state to any of the goal states.
/// Each call of [`AdStarSearch::advance`] expands one node; once the solution is bounded by
/// epsilon, epsilon can be lowered to improve it, and edge costs can be changed to repair it.
/// Both reuse the previous search effort.
///
/// - `F` generates the outgoing transitions of a state.
/// - `R` generates the incoming transitions of a state, reported from the state to the
///   predecessor.
/// - `W` evaluates the cost of a transition.
/// - `H` estimates the cost-to-goal of a state.
pub struct AdStarSearch<S, A, C, F, R, W, H> {
    successors: F,
    predecessors: R,
    cost_function: W,
    heuristic: H,
    store: NodeStore<S, A, C>,
    sets: ConsistencySets<C>,
    start: usize,
    goals: SmallVec<[usize; 1]>,
    epsilon: C,
    phase: Phase,
    pending_episode: bool,
    cost_overrides: FxHashMap<Transition<S, A>, C>,
    parameters: SearchParameters<C>,
    timer: Timer,
    expanded: usize,
    is_time_limit_reached: bool,
    is_expansion_limit_reached: bool,
}

impl<S, A, C, F, R, W, H> AdStarSearch<S, A, C, F, R, W, H>
where
    S: Hash + Eq + Clone,
    A: Hash + Eq + Clone,
    C: Float + Display,
    F: TransitionFunction<S, A>,
    R: TransitionFunction<S, A>,
    W: CostFunction<S, A, C>,
    H: HeuristicFunction<S, C>,
{
    /// Creates a new instance of AD*.
    ///
    /// The start node is opened with epsilon set to `parameters.initial_epsilon`.
    /// Fails if the parameters are invalid, no goal is given, or the heuristic rejects the
    /// start or a goal.
    pub fn new(
        start: S,
        goals: impl IntoIterator<Item = S>,
        successors: F,
        predecessors: R,
        cost_function: W,
        heuristic: H,
        parameters: SearchParameters<C>,
    ) -> Result<Self> {
        parameters.validate()?;

        let mut timer = parameters
            .time_limit
            .map(Timer::with_time_limit)
            .unwrap_or_default();
        timer.start();

        let mut store = parameters
            .initial_registry_capacity
            .map(NodeStore::with_capacity)
            .unwrap_or_default();

        let h = check_heuristic(heuristic.estimate(&start))?;
        let (start, _) = store.get_or_create(start, h);

        let mut goal_indices: SmallVec<[usize; 1]> = SmallVec::new();

        for goal in goals {
            let index = match store.existing(&goal) {
                Some(index) => index,
                None => {
                    let h = check_heuristic(heuristic.estimate(&goal))?;
                    store.get_or_create(goal, h).0
                }
            };

            if !goal_indices.contains(&index) {
                goal_indices.push(index);
            }
        }

        if goal_indices.is_empty() {
            return Err(SearchError::InvalidParameter(
                "at least one goal state is required".to_string(),
            ));
        }

        let epsilon = parameters.get_initial_epsilon();
        store.get_mut(start).set_g(C::zero(), None);
        let mut sets = ConsistencySets::default();
        sets.insert_open(&mut store, start, epsilon);

        let mut search = Self {
            successors,
            predecessors,
            cost_function,
            heuristic,
            store,
            sets,
            start,
            goals: goal_indices,
            epsilon,
            phase: Phase::Expanding,
            pending_episode: false,
            cost_overrides: FxHashMap::default(),
            parameters,
            timer,
            expanded: 0,
            is_time_limit_reached: false,
            is_expansion_limit_reached: false,
        };
        search.refresh_phase();
        search.timer.stop();

        Ok(search)
    }

    /// Runs one step of the search.
    ///
    /// Expands the most promising open node, or returns [`ExpansionResult::Converged`] without
    /// doing anything if the solution is already bounded by the current epsilon.
    /// If a collaborator violates its contract, the error is returned and the step has no
    /// effect.
    pub fn advance(&mut self) -> Result<ExpansionResult<S, C>> {
        if self.pending_episode {
            self.begin_episode();
        }

        let Some(index) = self.select() else {
            self.mark_converged();

            return Ok(ExpansionResult::Converged);
        };

        self.phase = Phase::Expanding;

        let consistency = if self.store.get(index).is_overconsistent() {
            self.expand_overconsistent(index)?;
            Consistency::Overconsistent
        } else {
            self.expand_underconsistent(index)?;
            Consistency::Underconsistent
        };

        self.expanded += 1;

        let node = self.store.get(index);
        let expanded = ExpandedNode {
            state: node.get_state().clone(),
            consistency,
            g: node.get_g(),
            v: node.get_v(),
        };
        trace!(
            g = %expanded.g,
            v = %expanded.v,
            ?consistency,
            open = self.sets.open_len(),
            frontier = self.sets.frontier_len(),
            "expanded"
        );

        if self.select().is_none() {
            self.mark_converged();
        }

        Ok(ExpansionResult::Expanded(expanded))
    }

    /// Lowers epsilon and starts a new episode.
    ///
    /// Fails with [`SearchError::InvalidEpsilon`] and leaves the search unchanged
    /// if `epsilon` is greater than the current epsilon or smaller than one.
    pub fn lower_epsilon(&mut self, epsilon: C) -> Result<()> {
        if !(epsilon >= C::one()) || epsilon > self.epsilon {
            return Err(SearchError::InvalidEpsilon {
                current: to_f64(self.epsilon),
                requested: to_f64(epsilon),
            });
        }

        debug!(from = %self.epsilon, to = %epsilon, "lowering epsilon");
        self.epsilon = epsilon;
        self.begin_episode();
        self.refresh_phase();

        Ok(())
    }

    /// Notifies that the cost of an edge has changed.
    ///
    /// `transition` must be a forward transition with a known origin, and `cost` overrides
    /// the cost function for it from now on.
    /// An infinite cost blocks the edge.
    /// The cost-to-come of the head of the edge is recomputed, and the search resumes with a
    /// new episode at the next call of [`AdStarSearch::advance`].
    pub fn notify_edge_changed(&mut self, transition: &Transition<S, A>, cost: C) -> Result<()> {
        if cost.is_nan() {
            return Err(SearchError::NonFiniteCost { cost: to_f64(cost) });
        }

        if cost < C::zero() {
            return Err(SearchError::NegativeCost { cost: to_f64(cost) });
        }

        if transition.from.is_none() {
            return Err(SearchError::InvalidParameter(
                "the origin of a changed edge must be known".to_string(),
            ));
        }

        let head = match self.store.existing(&transition.to) {
            Some(head) if head != self.start => head,
            _ => {
                self.cost_overrides.insert(transition.clone(), cost);

                return Ok(());
            }
        };

        let mut predecessors = self.gather_predecessors(&transition.to)?;
        let mut found = false;

        for predecessor in predecessors.iter_mut() {
            if predecessor.transition == *transition {
                predecessor.cost = cost;
                found = true;
            }
        }

        if !found {
            return Err(SearchError::InconsistentCollaborator);
        }

        self.cost_overrides.insert(transition.clone(), cost);
        let (g, back_pointer) = self.best_predecessor(head, &predecessors);
        debug!(
            cost = %cost,
            old_g = %self.store.get(head).get_g(),
            new_g = %g,
            "edge changed"
        );
        self.store.get_mut(head).set_g(g, back_pointer);
        self.sets
            .update_membership(&mut self.store, head, self.epsilon);
        self.pending_episode = true;
        self.phase = Phase::Expanding;

        Ok(())
    }

    /// Returns the states from the start to `state` along the back pointers.
    ///
    /// Fails with [`SearchError::UnreachableGoal`] if no path to `state` is known.
    pub fn extract_path(&self, state: &S) -> Result<Vec<S>> {
        let mut index = self
            .store
            .existing(state)
            .ok_or(SearchError::UnreachableGoal)?;

        if !self.store.get(index).is_reached() {
            return Err(SearchError::UnreachableGoal);
        }

        let mut path = vec![self.store.get(index).get_state().clone()];

        for _ in 0..self.store.len() {
            if index == self.start {
                path.reverse();

                return Ok(path);
            }

            index = self
                .store
                .get(index)
                .get_back_pointer()
                .ok_or(SearchError::UnreachableGoal)?
                .node;
            path.push(self.store.get(index).get_state().clone());
        }

        Err(SearchError::UnreachableGoal)
    }

    /// Returns the current epsilon.
    pub fn current_epsilon(&self) -> C {
        self.epsilon
    }

    /// Returns whether the solution is bounded by the current epsilon.
    pub fn is_converged(&self) -> bool {
        self.phase != Phase::Expanding
    }

    /// Returns the phase of the current episode.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the best known cost-to-come of a state, or `None` if it is not reached.
    pub fn cost_to(&self, state: &S) -> Option<C> {
        self.store
            .existing(state)
            .map(|index| self.store.get(index))
            .filter(|node| node.is_reached())
            .map(|node| node.get_g())
    }

    /// Returns the goal the current solution leads to.
    pub fn best_goal(&self) -> Option<&S> {
        self.best_goal_index()
            .map(|index| self.store.get(index).get_state())
    }

    /// Returns the search node of a state if it has been visited.
    pub fn get_node(&self, state: &S) -> Option<&AdNode<S, A, C>> {
        self.store.existing(state).map(|index| self.store.get(index))
    }

    /// Returns the start state.
    pub fn get_start(&self) -> &S {
        self.store.get(self.start).get_state()
    }

    /// Returns the number of nodes expanded so far.
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    /// Returns the number of nodes generated so far.
    pub fn generated(&self) -> usize {
        self.store.len()
    }

    /// Returns the number of open nodes.
    pub fn open_len(&self) -> usize {
        self.sets.open_len()
    }

    /// Returns the current solution.
    ///
    /// The cost is the g-value of the goal. Nodes on the path that were improved after
    /// their expansion wait for the next episode, so the path itself may be cheaper.
    pub fn get_solution(&self) -> Solution<S, C> {
        let mut solution = Solution {
            expanded: self.expanded,
            generated: self.generated(),
            time: self.timer.get_elapsed_time(),
            is_time_limit_reached: self.is_time_limit_reached,
            is_expansion_limit_reached: self.is_expansion_limit_reached,
            ..Default::default()
        };

        if let Some(goal) = self.best_goal_index() {
            let node = self.store.get(goal);

            if let Ok(path) = self.extract_path(node.get_state()) {
                solution.cost = Some(node.get_g());
                solution.path = path;
            }
        }

        if self.is_converged() {
            if solution.cost.is_some() {
                solution.epsilon = Some(self.epsilon);
                solution.is_optimal = self.epsilon <= C::one();
            } else {
                solution.is_infeasible = true;
            }
        }

        solution
    }

    fn best_goal_index(&self) -> Option<usize> {
        self.goals
            .iter()
            .copied()
            .filter(|&index| {
                let node = self.store.get(index);
                node.is_reached() && !node.is_underconsistent()
            })
            .min_by_key(|&index| self.store.get(index).get_key(self.epsilon))
    }

    /// Returns the node to expand next, or `None` if the current episode has converged.
    fn select(&mut self) -> Option<usize> {
        let (index, key) = self.sets.peek_best(&self.store)?;

        let Some(goal) = self.best_goal_index() else {
            return Some(index);
        };
        let goal_key = self.store.get(goal).get_key(self.epsilon);

        // An underconsistent node tied with the goal may still raise the goal's value.
        if key < goal_key || (key == goal_key && self.store.get(index).is_underconsistent()) {
            Some(index)
        } else {
            None
        }
    }

    fn refresh_phase(&mut self) {
        if self.pending_episode || self.select().is_some() {
            self.phase = Phase::Expanding;
        } else {
            self.mark_converged();
        }
    }

    fn mark_converged(&mut self) {
        let phase = if self.epsilon <= C::one() {
            Phase::AwaitingChange
        } else {
            Phase::Converged
        };

        if self.phase == Phase::Expanding {
            match self.best_goal_index() {
                Some(goal) => debug!(
                    cost = %self.store.get(goal).get_g(),
                    epsilon = %self.epsilon,
                    expanded = self.expanded,
                    "episode converged"
                ),
                None => debug!(expanded = self.expanded, "episode converged without a solution"),
            }
        }

        self.phase = phase;
    }

    fn begin_episode(&mut self) {
        self.sets.begin_episode(&mut self.store, self.epsilon);
        self.pending_episode = false;
        debug!(
            epsilon = %self.epsilon,
            open = self.sets.open_len(),
            "new episode"
        );
    }

    fn edge_cost(&self, transition: &Transition<S, A>) -> Result<C> {
        if let Some(&cost) = self.cost_overrides.get(transition) {
            return Ok(cost);
        }

        check_cost(self.cost_function.evaluate(transition))
    }

    fn forward_transitions(&self, state: &S) -> Result<Vec<Transition<S, A>>> {
        self.successors
            .get_transitions(state)
            .into_iter()
            .map(|transition| {
                let transition = transition.with_origin(state);

                if transition.from.as_ref() == Some(state) {
                    Ok(transition)
                } else {
                    Err(SearchError::InconsistentCollaborator)
                }
            })
            .collect()
    }

    fn gather_successors(&self, state: &S) -> Result<Vec<Successor<S, A, C>>> {
        self.forward_transitions(state)?
            .into_iter()
            .map(|transition| {
                let cost = self.edge_cost(&transition)?;
                let h = match self.store.existing(&transition.to) {
                    Some(index) => self.store.get(index).get_h(),
                    None => check_heuristic(self.heuristic.estimate(&transition.to))?,
                };

                Ok(Successor {
                    transition,
                    cost,
                    h,
                })
            })
            .collect()
    }

    fn gather_predecessors(&self, state: &S) -> Result<Vec<Predecessor<S, A, C>>> {
        let reversed = self
            .predecessors
            .get_transitions(state)
            .into_iter()
            .collect::<Vec<_>>();

        reversed
            .into_iter()
            .map(|reverse| {
                if reverse.from.as_ref().is_some_and(|from| from != state) {
                    return Err(SearchError::InconsistentCollaborator);
                }

                let transition = Transition::new(reverse.to, state.clone(), reverse.action);
                let cost = self.edge_cost(&transition)?;
                let node = transition
                    .from
                    .as_ref()
                    .and_then(|from| self.store.existing(from));

                Ok(Predecessor {
                    transition,
                    node,
                    cost,
                })
            })
            .collect()
    }

    /// Returns whether following the back pointers from `node` reaches `target`.
    ///
    /// A chain that neither reaches `target` nor ends is treated as reaching it.
    fn derives_from(&self, mut node: usize, target: usize) -> bool {
        for _ in 0..self.store.len() {
            if node == target {
                return true;
            }

            match self.store.get(node).get_back_pointer() {
                Some(back_pointer) => node = back_pointer.node,
                None => return false,
            }
        }

        true
    }

    /// Computes the g-value of a node from its predecessors.
    ///
    /// Predecessors whose value was derived from the node itself are ignored;
    /// with zero-cost cycles they would keep a stale value alive.
    fn best_predecessor(
        &self,
        index: usize,
        predecessors: &[Predecessor<S, A, C>],
    ) -> (C, Option<BackPointer<A>>) {
        let mut best = (C::infinity(), None);

        for predecessor in predecessors {
            if let Some(node) = predecessor.node {
                let value = self.store.get(node).get_v() + predecessor.cost;

                if value < best.0 && !self.derives_from(node, index) {
                    best = (
                        value,
                        Some(BackPointer {
                            node,
                            action: predecessor.transition.action.clone(),
                        }),
                    );
                }
            }
        }

        best
    }

    /// Checks that the edge realizing the back pointer of a node is reported by the
    /// predecessor function.
    fn check_back_pointer(&self, index: usize, predecessors: &[Predecessor<S, A, C>]) -> Result<()> {
        match self.store.get(index).get_back_pointer() {
            Some(back_pointer)
                if !predecessors.iter().any(|predecessor| {
                    predecessor.node == Some(back_pointer.node)
                        && predecessor.transition.action == back_pointer.action
                }) =>
            {
                Err(SearchError::InconsistentCollaborator)
            }
            _ => Ok(()),
        }
    }

    /// Returns the successors of a node whose back pointer is the node.
    fn dependent_successors(&self, index: usize, state: &S) -> Result<SmallVec<[usize; 4]>> {
        let mut dependents: SmallVec<[usize; 4]> = SmallVec::new();

        for transition in self.forward_transitions(state)? {
            let Some(successor) = self.store.existing(&transition.to) else {
                continue;
            };

            if successor == index || successor == self.start || dependents.contains(&successor) {
                continue;
            }

            if self
                .store
                .get(successor)
                .get_back_pointer()
                .is_some_and(|back_pointer| back_pointer.node == index)
            {
                dependents.push(successor);
            }
        }

        Ok(dependents)
    }

    fn expand_overconsistent(&mut self, index: usize) -> Result<()> {
        let state = self.store.get(index).get_state().clone();
        let successors = self.gather_successors(&state)?;

        let g = self.store.get(index).get_g();
        self.store.get_mut(index).set_v(g);
        self.sets.move_to_closed(&mut self.store, index);

        for Successor {
            transition,
            cost,
            h,
        } in successors
        {
            let (successor, _) = self.store.get_or_create(transition.to, h);
            let candidate = g + cost;

            if candidate < self.store.get(successor).get_g() {
                self.store.get_mut(successor).set_g(
                    candidate,
                    Some(BackPointer {
                        node: index,
                        action: transition.action,
                    }),
                );
                self.sets
                    .update_membership(&mut self.store, successor, self.epsilon);
            }
        }

        Ok(())
    }

    fn expand_underconsistent(&mut self, index: usize) -> Result<()> {
        let state = self.store.get(index).get_state().clone();

        let own_predecessors = if index == self.start {
            None
        } else {
            let predecessors = self.gather_predecessors(&state)?;
            self.check_back_pointer(index, &predecessors)?;

            Some(predecessors)
        };

        let mut dependents = Vec::new();

        for successor in self.dependent_successors(index, &state)? {
            let successor_state = self.store.get(successor).get_state().clone();
            let predecessors = self.gather_predecessors(&successor_state)?;
            self.check_back_pointer(successor, &predecessors)?;
            dependents.push((successor, predecessors));
        }

        self.store.get_mut(index).set_v(C::infinity());
        self.sets.remove(&mut self.store, index);

        if let Some(predecessors) = own_predecessors {
            let (g, back_pointer) = self.best_predecessor(index, &predecessors);
            self.store.get_mut(index).set_g(g, back_pointer);
        }

        self.sets
            .update_membership(&mut self.store, index, self.epsilon);

        for (successor, predecessors) in dependents {
            let (g, back_pointer) = self.best_predecessor(successor, &predecessors);
            self.store.get_mut(successor).set_g(g, back_pointer);
            self.sets
                .update_membership(&mut self.store, successor, self.epsilon);
        }

        Ok(())
    }

    /// Expands nodes until the current episode converges or a limit is reached.
    fn run_episode(&mut self) -> Result<()> {
        loop {
            if self.timer.check_time_limit() {
                if !self.is_time_limit_reached {
                    info!("Time limit reached.");
                }

                self.is_time_limit_reached = true;

                return Ok(());
            }

            if self
                .parameters
                .expansion_limit
                .is_some_and(|limit| self.expanded >= limit)
            {
                if !self.is_expansion_limit_reached {
                    info!("Expansion limit reached.");
                }

                self.is_expansion_limit_reached = true;

                return Ok(());
            }

            if self.advance()? == ExpansionResult::Converged {
                return Ok(());
            }
        }
    }
}

impl<S, A, C, F, R, W, H> Search for AdStarSearch<S, A, C, F, R, W, H>
where
    S: Hash + Eq + Clone,
    A: Hash + Eq + Clone,
    C: Float + Display,
    F: TransitionFunction<S, A>,
    R: TransitionFunction<S, A>,
    W: CostFunction<S, A, C>,
    H: HeuristicFunction<S, C>,
{
    type State = S;
    type CostType = C;

    /// Runs the current episode to convergence and reports its solution.
    ///
    /// Unless the final epsilon is reached, epsilon is lowered by the decrement afterwards,
    /// so the next call improves the solution.
    fn search_next(&mut self) -> Result<(Solution<S, C>, bool)> {
        self.timer.start();
        let result = self.run_episode();
        self.timer.stop();
        result?;

        let solution = self.get_solution();

        if let Some(cost) = solution.cost {
            info!(
                cost = %cost,
                epsilon = %self.epsilon,
                expanded = solution.expanded,
                generated = solution.generated,
                time = solution.time,
                "New solution."
            );
        }

        if solution.is_time_limit_reached
            || solution.is_expansion_limit_reached
            || solution.is_infeasible
        {
            if solution.is_infeasible {
                info!("Proved infeasible.");
            }

            return Ok((solution, true));
        }

        let final_epsilon = self.parameters.get_final_epsilon();

        if self.epsilon <= final_epsilon {
            if solution.is_optimal {
                info!("Optimal solution found.");
            }

            return Ok((solution, true));
        }

        let next = (self.epsilon - self.parameters.get_epsilon_decrement()).max(final_epsilon);
        self.lower_epsilon(next)?;

        Ok((solution, false))
    }
}

impl<S, A, C, F, R, W, H> Iterator for AdStarSearch<S, A, C, F, R, W, H>
where
    S: Hash + Eq + Clone,
    A: Hash + Eq + Clone,
    C: Float + Display,
    F: TransitionFunction<S, A>,
    R: TransitionFunction<S, A>,
    W: CostFunction<S, A, C>,
    H: HeuristicFunction<S, C>,
{
    type Item = Result<ExpandedNode<S, C>>;

    /// Expands the next node, or returns `None` once the current episode has converged.
    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(ExpansionResult::Expanded(node)) => Some(Ok(node)),
            Ok(ExpansionResult::Converged) => None,
            Err(error) => Some(Err(error)),
        }
    }
}
