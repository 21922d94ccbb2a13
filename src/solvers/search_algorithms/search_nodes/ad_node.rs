use super::{Membership, NodeKey};
use num_traits::Float;

/// Back pointer of a node: the predecessor realizing its g-value and the action of the edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackPointer<A> {
    /// Index of the predecessor in the node store.
    pub node: usize,
    /// Action of the edge from the predecessor.
    pub action: A,
}

/// Search node of AD*.
///
/// `g` is the one-step lookahead cost-to-come, i.e., the minimum of `v(p) + c(p, s)` over the
/// predecessors `p`, and `v` is the value of `g` when the node was last expanded.
/// A node is overconsistent if `v > g`, underconsistent if `v < g`,
/// and locally consistent otherwise.
#[derive(Clone, Debug)]
pub struct AdNode<S, A, C> {
    state: S,
    g: C,
    v: C,
    h: C,
    back_pointer: Option<BackPointer<A>>,
    membership: Membership,
    generation: u64,
}

impl<S, A, C> AdNode<S, A, C>
where
    C: Float,
{
    /// Creates a node that has not been reached yet.
    pub fn new(state: S, h: C) -> Self {
        Self {
            state,
            g: C::infinity(),
            v: C::infinity(),
            h,
            back_pointer: None,
            membership: Membership::None,
            generation: 0,
        }
    }

    pub fn get_state(&self) -> &S {
        &self.state
    }

    pub fn get_g(&self) -> C {
        self.g
    }

    pub fn get_v(&self) -> C {
        self.v
    }

    pub fn get_h(&self) -> C {
        self.h
    }

    pub fn get_back_pointer(&self) -> Option<&BackPointer<A>> {
        self.back_pointer.as_ref()
    }

    pub fn get_membership(&self) -> Membership {
        self.membership
    }

    /// Returns the generation of the latest frontier entry of the node.
    pub fn get_generation(&self) -> u64 {
        self.generation
    }

    pub fn set_g(&mut self, g: C, back_pointer: Option<BackPointer<A>>) {
        self.g = g;
        self.back_pointer = back_pointer;
    }

    pub fn set_v(&mut self, v: C) {
        self.v = v;
    }

    pub(crate) fn set_membership(&mut self, membership: Membership) {
        self.membership = membership;
    }

    /// Invalidates the frontier entries pushed so far and returns the new generation.
    pub(crate) fn next_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    pub fn is_overconsistent(&self) -> bool {
        self.v > self.g
    }

    pub fn is_underconsistent(&self) -> bool {
        self.v < self.g
    }

    pub fn is_consistent(&self) -> bool {
        self.v == self.g
    }

    /// Returns whether the node has a finite cost-to-come.
    pub fn is_reached(&self) -> bool {
        self.g.is_finite()
    }

    /// Computes the priority of the node under the suboptimality factor `epsilon`.
    ///
    /// An underconsistent node is prioritized by its old value without inflation,
    /// so that cost increases are propagated before they are relied on.
    pub fn get_key(&self, epsilon: C) -> NodeKey<C> {
        if self.v >= self.g {
            NodeKey::new(self.g + epsilon * self.h, self.g)
        } else {
            NodeKey::new(self.v + self.h, self.v)
        }
    }
}
