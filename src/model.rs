use num_traits::Zero;

/// Directed edge between two states.
///
/// `from` may be omitted by a transition function, in which case the state that was queried
/// is the origin.
/// The action is an opaque payload, e.g., an edge id or a motion primitive,
/// which distinguishes parallel edges between the same pair of states.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Transition<S, A> {
    /// Origin state.
    pub from: Option<S>,
    /// Destination state.
    pub to: S,
    /// Action payload.
    pub action: A,
}

impl<S, A> Transition<S, A> {
    /// Creates a transition from `from` to `to`.
    pub fn new(from: S, to: S, action: A) -> Self {
        Self {
            from: Some(from),
            to,
            action,
        }
    }

    /// Creates a transition whose origin is left to the caller.
    pub fn to(to: S, action: A) -> Self {
        Self {
            from: None,
            to,
            action,
        }
    }

    /// Returns the transition with its origin filled in by `origin` if it was omitted.
    pub fn with_origin(self, origin: &S) -> Self
    where
        S: Clone,
    {
        Self {
            from: self.from.or_else(|| Some(origin.clone())),
            to: self.to,
            action: self.action,
        }
    }
}

/// Trait for generating the transitions adjacent to a state.
///
/// Two instances are used by the search: one generating the outgoing transitions of a state
/// and one generating its incoming transitions.
/// An incoming transition of `s` is reported with `s` as its origin and the predecessor as its
/// destination, i.e., the edge `p -> s` is reported as `s -> p` with the same action.
///
/// Any closure `Fn(&S) -> impl IntoIterator<Item = Transition<S, A>>` implements this trait.
///
/// # Examples
///
/// ```
/// use adstar::{Transition, TransitionFunction};
///
/// let successors = |state: &u32| vec![Transition::new(*state, state + 1, ())];
/// let transitions: Vec<_> = successors.get_transitions(&3).into_iter().collect();
/// assert_eq!(transitions, vec![Transition::new(3, 4, ())]);
/// ```
pub trait TransitionFunction<S, A> {
    /// Gets the transitions adjacent to a state.
    ///
    /// The sequence must be finite and deterministic.
    fn get_transitions(&self, state: &S) -> impl IntoIterator<Item = Transition<S, A>>;
}

impl<S, A, F, I> TransitionFunction<S, A> for F
where
    F: Fn(&S) -> I,
    I: IntoIterator<Item = Transition<S, A>>,
{
    fn get_transitions(&self, state: &S) -> impl IntoIterator<Item = Transition<S, A>> {
        self(state)
    }
}

/// Trait for evaluating the cost of a transition.
///
/// The search only evaluates forward transitions, so `from` is always set.
/// Costs must be non-negative and finite.
pub trait CostFunction<S, A, C> {
    /// Evaluates the cost of a transition.
    fn evaluate(&self, transition: &Transition<S, A>) -> C;
}

impl<S, A, C, F> CostFunction<S, A, C> for F
where
    F: Fn(&Transition<S, A>) -> C,
{
    fn evaluate(&self, transition: &Transition<S, A>) -> C {
        self(transition)
    }
}

/// Trait for estimating the cost from a state to the closest goal.
///
/// Estimates must be non-negative and finite.
/// The solution is guaranteed to be within the suboptimality factor epsilon
/// only if the heuristic is consistent.
pub trait HeuristicFunction<S, C> {
    /// Estimates the cost-to-goal of a state.
    fn estimate(&self, state: &S) -> C;
}

impl<S, C, F> HeuristicFunction<S, C> for F
where
    F: Fn(&S) -> C,
{
    fn estimate(&self, state: &S) -> C {
        self(state)
    }
}

/// Heuristic returning zero for every state.
///
/// With this heuristic, the search behaves like an incremental Dijkstra's algorithm
/// and epsilon has no effect.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZeroHeuristic;

impl<S, C> HeuristicFunction<S, C> for ZeroHeuristic
where
    C: Zero,
{
    fn estimate(&self, _: &S) -> C {
        C::zero()
    }
}
