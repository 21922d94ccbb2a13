use super::{AdNode, Membership, NodeKey, NodeStore};
use num_traits::Float;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::Hash;

/// Entry of the frontier queue.
///
/// An entry is stale if its node left the open set or was pushed again afterwards.
struct FrontierEntry<C> {
    key: NodeKey<C>,
    underconsistent: bool,
    node: usize,
    generation: u64,
}

impl<C: PartialOrd> PartialEq for FrontierEntry<C> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<C: PartialOrd> Eq for FrontierEntry<C> {}

impl<C: PartialOrd> Ord for FrontierEntry<C> {
    // Reversed to pop the smallest key from the max-heap. Among equal keys, underconsistent
    // nodes come first, then creation order.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .cmp(&self.key)
            .then_with(|| self.underconsistent.cmp(&other.underconsistent))
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl<C: PartialOrd> PartialOrd for FrontierEntry<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Open, closed, and inconsistent sets over the nodes of a node store.
///
/// The membership of a node is stored in the node itself.
/// The open set is backed by a binary heap with lazy deletion:
/// re-prioritizing a node pushes a new entry, and outdated entries are discarded when they
/// reach the top of the heap.
/// The closed and inconsistent lists only remember which nodes to reset at the next episode
/// boundary and may contain outdated indices.
pub struct ConsistencySets<C> {
    frontier: BinaryHeap<FrontierEntry<C>>,
    closed: Vec<usize>,
    incons: Vec<usize>,
    open_len: usize,
}

impl<C> Default for ConsistencySets<C>
where
    C: PartialOrd,
{
    fn default() -> Self {
        Self {
            frontier: BinaryHeap::new(),
            closed: Vec::new(),
            incons: Vec::new(),
            open_len: 0,
        }
    }
}

impl<C> ConsistencySets<C>
where
    C: Float,
{
    /// Inserts a node into the open set, or re-prioritizes it if it is already open.
    pub fn insert_open<S, A>(&mut self, store: &mut NodeStore<S, A, C>, index: usize, epsilon: C)
    where
        S: Hash + Eq + Clone,
    {
        let node = store.get_mut(index);

        if node.get_membership() != Membership::Open {
            self.open_len += 1;
            node.set_membership(Membership::Open);
        }

        self.push(index, node, epsilon);
    }

    fn push<S, A>(&mut self, index: usize, node: &mut AdNode<S, A, C>, epsilon: C) {
        let key = node.get_key(epsilon);
        let underconsistent = node.is_underconsistent();
        let generation = node.next_generation();
        self.frontier.push(FrontierEntry {
            key,
            underconsistent,
            node: index,
            generation,
        });
    }

    fn leave_open<S, A>(&mut self, store: &NodeStore<S, A, C>, index: usize)
    where
        S: Hash + Eq + Clone,
    {
        if store.get(index).get_membership() == Membership::Open {
            self.open_len -= 1;
        }
    }

    /// Moves a node to the closed set.
    pub fn move_to_closed<S, A>(&mut self, store: &mut NodeStore<S, A, C>, index: usize)
    where
        S: Hash + Eq + Clone,
    {
        self.leave_open(store, index);
        store.get_mut(index).set_membership(Membership::Closed);
        self.closed.push(index);
    }

    /// Moves a node to the inconsistent set.
    pub fn move_to_incons<S, A>(&mut self, store: &mut NodeStore<S, A, C>, index: usize)
    where
        S: Hash + Eq + Clone,
    {
        self.leave_open(store, index);
        store.get_mut(index).set_membership(Membership::Incons);
        self.incons.push(index);
    }

    /// Removes a node from the open set.
    ///
    /// Its frontier entries become stale.
    pub fn remove<S, A>(&mut self, store: &mut NodeStore<S, A, C>, index: usize)
    where
        S: Hash + Eq + Clone,
    {
        if store.get(index).get_membership() == Membership::Open {
            self.leave_open(store, index);
            store.get_mut(index).set_membership(Membership::None);
        }
    }

    /// Places a node in the set matching its consistency.
    ///
    /// An inconsistent node goes to the open set unless it was already expanded in this
    /// episode, in which case it is deferred to the inconsistent set.
    /// A consistent node leaves the open and inconsistent sets.
    pub fn update_membership<S, A>(
        &mut self,
        store: &mut NodeStore<S, A, C>,
        index: usize,
        epsilon: C,
    ) where
        S: Hash + Eq + Clone,
    {
        let node = store.get(index);
        let membership = node.get_membership();

        if !node.is_consistent() {
            match membership {
                Membership::Closed => self.move_to_incons(store, index),
                Membership::Incons => {}
                Membership::None | Membership::Open => self.insert_open(store, index, epsilon),
            }
        } else {
            match membership {
                Membership::Open => self.remove(store, index),
                Membership::Incons => store.get_mut(index).set_membership(Membership::Closed),
                Membership::None | Membership::Closed => {}
            }
        }
    }

    /// Returns the open node with the smallest key, discarding stale frontier entries.
    ///
    /// Among open nodes with the smallest key, an underconsistent one is returned if any.
    pub fn peek_best<S, A>(&mut self, store: &NodeStore<S, A, C>) -> Option<(usize, NodeKey<C>)>
    where
        S: Hash + Eq + Clone,
    {
        while let Some(entry) = self.frontier.peek() {
            let node = store.get(entry.node);

            if node.get_membership() == Membership::Open
                && node.get_generation() == entry.generation
            {
                return Some((entry.node, entry.key));
            }

            self.frontier.pop();
        }

        None
    }

    /// Starts a new episode.
    ///
    /// Closed nodes are released, inconsistent nodes are moved to the open set,
    /// and the frontier is rebuilt with keys computed under `epsilon`.
    pub fn begin_episode<S, A>(&mut self, store: &mut NodeStore<S, A, C>, epsilon: C)
    where
        S: Hash + Eq + Clone,
    {
        for index in self.closed.drain(..) {
            let node = store.get_mut(index);

            if node.get_membership() == Membership::Closed {
                node.set_membership(Membership::None);
            }
        }

        let mut open = self
            .frontier
            .drain()
            .filter(|entry| {
                let node = store.get(entry.node);
                node.get_membership() == Membership::Open
                    && node.get_generation() == entry.generation
            })
            .map(|entry| entry.node)
            .collect::<Vec<_>>();

        for index in self.incons.drain(..) {
            let node = store.get_mut(index);

            if node.get_membership() == Membership::Incons {
                node.set_membership(Membership::Open);
                self.open_len += 1;
                open.push(index);
            }
        }

        for index in open {
            self.push(index, store.get_mut(index), epsilon);
        }
    }

    /// Returns the number of open nodes.
    pub fn open_len(&self) -> usize {
        self.open_len
    }

    /// Returns the number of entries in the frontier, including stale ones.
    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_store(n: usize, h: f64) -> NodeStore<usize, (), f64> {
        let mut store = NodeStore::default();

        for i in 0..n {
            store.get_or_create(i, h);
        }

        store
    }

    #[test]
    fn test_peek_best_orders_by_key() {
        let mut store = create_store(3, 0.0);
        let mut sets = ConsistencySets::default();

        for (i, g) in [(0, 3.0), (1, 1.0), (2, 2.0)] {
            store.get_mut(i).set_g(g, None);
            sets.insert_open(&mut store, i, 1.0);
        }

        assert_eq!(sets.open_len(), 3);
        assert_eq!(sets.peek_best(&store).map(|(i, _)| i), Some(1));
        sets.move_to_closed(&mut store, 1);
        assert_eq!(sets.peek_best(&store).map(|(i, _)| i), Some(2));
        sets.move_to_closed(&mut store, 2);
        assert_eq!(sets.peek_best(&store).map(|(i, _)| i), Some(0));
        sets.move_to_closed(&mut store, 0);
        assert_eq!(sets.peek_best(&store), None);
        assert_eq!(sets.open_len(), 0);
        assert_eq!(sets.frontier_len(), 0);
    }

    #[test]
    fn test_reinsertion_makes_old_entry_stale() {
        let mut store = create_store(2, 0.0);
        let mut sets = ConsistencySets::default();

        store.get_mut(0).set_g(5.0, None);
        sets.insert_open(&mut store, 0, 1.0);
        store.get_mut(1).set_g(3.0, None);
        sets.insert_open(&mut store, 1, 1.0);

        store.get_mut(0).set_g(1.0, None);
        sets.insert_open(&mut store, 0, 1.0);
        assert_eq!(sets.open_len(), 2);
        assert_eq!(sets.frontier_len(), 3);

        let (best, key) = sets.peek_best(&store).unwrap();
        assert_eq!(best, 0);
        assert_eq!(key, NodeKey::new(1.0, 1.0));

        sets.move_to_closed(&mut store, 0);
        assert_eq!(sets.peek_best(&store).map(|(i, _)| i), Some(1));
        sets.move_to_closed(&mut store, 1);

        // The entry with key 5 is stale and silently discarded.
        assert_eq!(sets.peek_best(&store), None);
        assert_eq!(sets.frontier_len(), 0);
    }

    #[test]
    fn test_underconsistent_first_on_ties() {
        let mut store = create_store(3, 0.0);
        let mut sets = ConsistencySets::default();

        store.get_mut(0).set_g(2.0, None);
        sets.insert_open(&mut store, 0, 1.0);
        store.get_mut(1).set_v(2.0);
        store.get_mut(1).set_g(5.0, None);
        sets.insert_open(&mut store, 1, 1.0);
        store.get_mut(2).set_g(2.0, None);
        sets.insert_open(&mut store, 2, 1.0);

        let (best, key) = sets.peek_best(&store).unwrap();
        assert_eq!(best, 1);
        assert_eq!(key, NodeKey::new(2.0, 2.0));
        sets.remove(&mut store, 1);
        assert_eq!(sets.peek_best(&store).map(|(i, _)| i), Some(0));

        // The order survives the frontier rebuild.
        sets.insert_open(&mut store, 1, 1.0);
        sets.begin_episode(&mut store, 1.0);
        assert_eq!(sets.peek_best(&store).map(|(i, _)| i), Some(1));
    }

    #[test]
    fn test_remove_is_lazy() {
        let mut store = create_store(1, 0.0);
        let mut sets = ConsistencySets::default();

        store.get_mut(0).set_g(1.0, None);
        sets.insert_open(&mut store, 0, 1.0);
        sets.remove(&mut store, 0);

        assert_eq!(store.get(0).get_membership(), Membership::None);
        assert_eq!(sets.open_len(), 0);
        assert_eq!(sets.frontier_len(), 1);
        assert_eq!(sets.peek_best(&store), None);
    }

    #[test]
    fn test_update_membership() {
        let mut store = create_store(3, 0.0);
        let mut sets = ConsistencySets::default();

        // Inconsistent and not expanded: open.
        store.get_mut(0).set_g(1.0, None);
        sets.update_membership(&mut store, 0, 1.0);
        assert_eq!(store.get(0).get_membership(), Membership::Open);

        // Consistent: leaves the open set.
        store.get_mut(0).set_v(1.0);
        sets.update_membership(&mut store, 0, 1.0);
        assert_eq!(store.get(0).get_membership(), Membership::None);
        assert_eq!(sets.open_len(), 0);

        // Expanded in this episode: deferred to the inconsistent set.
        store.get_mut(1).set_g(1.0, None);
        store.get_mut(1).set_v(1.0);
        sets.move_to_closed(&mut store, 1);
        store.get_mut(1).set_g(0.5, None);
        sets.update_membership(&mut store, 1, 1.0);
        assert_eq!(store.get(1).get_membership(), Membership::Incons);
        assert_eq!(sets.open_len(), 0);

        // Consistent again: back to closed.
        store.get_mut(1).set_g(1.0, None);
        sets.update_membership(&mut store, 1, 1.0);
        assert_eq!(store.get(1).get_membership(), Membership::Closed);

        // Consistent and never visited: nothing to do.
        sets.update_membership(&mut store, 2, 1.0);
        assert_eq!(store.get(2).get_membership(), Membership::None);
    }

    #[test]
    fn test_begin_episode() {
        let mut store = create_store(3, 1.0);
        let mut sets = ConsistencySets::default();

        // 0 is closed and consistent, 1 is closed and inconsistent, 2 is open.
        store.get_mut(0).set_g(0.0, None);
        store.get_mut(0).set_v(0.0);
        sets.move_to_closed(&mut store, 0);
        store.get_mut(1).set_g(1.0, None);
        store.get_mut(1).set_v(1.0);
        sets.move_to_closed(&mut store, 1);
        store.get_mut(1).set_g(0.5, None);
        sets.update_membership(&mut store, 1, 2.0);
        store.get_mut(2).set_g(2.0, None);
        sets.insert_open(&mut store, 2, 2.0);
        sets.insert_open(&mut store, 2, 2.0);
        assert_eq!(sets.frontier_len(), 2);

        sets.begin_episode(&mut store, 1.0);
        assert_eq!(store.get(0).get_membership(), Membership::None);
        assert_eq!(store.get(1).get_membership(), Membership::Open);
        assert_eq!(store.get(2).get_membership(), Membership::Open);
        assert_eq!(sets.open_len(), 2);
        assert_eq!(sets.frontier_len(), 2);

        let (best, key) = sets.peek_best(&store).unwrap();
        assert_eq!(best, 1);
        assert_eq!(key, NodeKey::new(1.5, 0.5));
        sets.move_to_closed(&mut store, 1);
        let (best, key) = sets.peek_best(&store).unwrap();
        assert_eq!(best, 2);
        assert_eq!(key, NodeKey::new(3.0, 2.0));
    }
}
