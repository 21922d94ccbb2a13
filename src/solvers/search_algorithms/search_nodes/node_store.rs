use super::AdNode;
use num_traits::Float;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

/// Arena owning one search node per visited state.
///
/// Nodes are addressed by their index, which is stable for the lifetime of the store.
/// Nodes are never removed.
pub struct NodeStore<S, A, C> {
    nodes: Vec<AdNode<S, A, C>>,
    index: FxHashMap<S, usize>,
}

impl<S, A, C> Default for NodeStore<S, A, C> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<S, A, C> NodeStore<S, A, C>
where
    S: Hash + Eq + Clone,
    C: Float,
{
    /// Creates a new node store with the given capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Returns the index of the node of a state, creating it with the heuristic value `h`
    /// if the state has not been visited.
    ///
    /// The second return value indicates whether the node was created.
    pub fn get_or_create(&mut self, state: S, h: C) -> (usize, bool) {
        match self.index.entry(state) {
            Entry::Occupied(entry) => (*entry.get(), false),
            Entry::Vacant(entry) => {
                let index = self.nodes.len();
                self.nodes.push(AdNode::new(entry.key().clone(), h));
                entry.insert(index);

                (index, true)
            }
        }
    }

    /// Returns the index of the node of a state if it has been visited.
    #[inline]
    pub fn existing(&self, state: &S) -> Option<usize> {
        self.index.get(state).copied()
    }

    #[inline]
    pub fn get(&self, index: usize) -> &AdNode<S, A, C> {
        &self.nodes[index]
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut AdNode<S, A, C> {
        &mut self.nodes[index]
    }

    /// Returns the number of visited states.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut store = NodeStore::<_, (), f64>::default();
        assert!(store.is_empty());

        let (a, created) = store.get_or_create("a", 1.0);
        assert!(created);
        let (b, created) = store.get_or_create("b", 2.0);
        assert!(created);
        assert_ne!(a, b);

        let (again, created) = store.get_or_create("a", 5.0);
        assert!(!created);
        assert_eq!(again, a);
        assert_eq!(store.get(a).get_h(), 1.0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_new_node_is_unreached() {
        let mut store = NodeStore::<_, (), f64>::with_capacity(4);
        let (index, _) = store.get_or_create(7, 0.0);
        let node = store.get(index);
        assert_eq!(node.get_state(), &7);
        assert!(node.get_g().is_infinite());
        assert!(node.get_v().is_infinite());
    }

    #[test]
    fn test_existing_never_creates() {
        let mut store = NodeStore::<_, (), f64>::default();
        assert_eq!(store.existing(&1), None);
        assert!(store.is_empty());

        let (index, _) = store.get_or_create(1, 0.0);
        assert_eq!(store.existing(&1), Some(index));
    }

    #[test]
    fn test_get_mut() {
        let mut store = NodeStore::<_, (), f64>::default();
        let (index, _) = store.get_or_create(1, 0.0);
        store.get_mut(index).set_g(3.0, None);
        assert_eq!(store.get(index).get_g(), 3.0);
        assert_eq!(store.len(), 1);
    }
}
