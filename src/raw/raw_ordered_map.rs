use core::borrow::Borrow;
use core::cmp::Ordering;

use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Node, Side};

/// Stack of ancestors still to visit during an in-order walk.
///
/// The inline capacity absorbs reasonably balanced trees; a degenerate
/// (list-shaped) tree spills to the heap, which keeps traversal depth
/// independent of the call stack.
type TraversalStack = SmallVec<[Handle; 16]>;

/// The unbalanced binary search tree backing `OrderedMap`.
///
/// Every node is owned by exactly one slot: its parent's left or right child
/// slot, or the tree's root slot. For every node, all keys in its left
/// subtree compare less and all keys in its right subtree compare greater
/// than its own key; the tree holds no duplicates. `len` always equals the
/// number of nodes reachable from `root`.
///
/// No rebalancing is performed anywhere. Sorted insertion order degrades the
/// tree to a list and every operation to O(n); that is an accepted property
/// of this design, not a defect.
#[derive(Clone)]
pub(crate) struct RawOrderedMap<K, V> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K, V>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
    /// Total number of key-value pairs in the tree.
    len: usize,
}

impl<K, V> RawOrderedMap<K, V> {
    /// Creates a new, empty tree.
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            len: 0,
        }
    }

    /// Creates a new tree with room for `capacity` nodes.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: None,
            len: 0,
        }
    }

    /// Returns the number of key-value pairs in the tree.
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the tree contains no elements.
    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the capacity of the tree.
    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Returns the handle of the root node, if any.
    pub(crate) const fn root(&self) -> Option<Handle> {
        self.root
    }

    /// Returns a reference to a node by handle.
    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V> {
        self.nodes.get(handle)
    }

    /// Returns a mutable reference to a node by handle.
    pub(crate) fn node_mut(&mut self, handle: Handle) -> &mut Node<K, V> {
        self.nodes.get_mut(handle)
    }

    /// Returns a reference to a node by handle from a raw pointer.
    ///
    /// # Safety
    /// - `ptr` must point to a valid, allocated `RawOrderedMap<K, V>`.
    pub(crate) unsafe fn node_ptr<'a>(ptr: *const Self, handle: Handle) -> &'a Node<K, V> {
        // SAFETY: Caller guarantees ptr is valid. Only the nodes field is read.
        unsafe { Arena::get_ptr(core::ptr::addr_of!((*ptr).nodes), handle) }
    }

    /// Returns a mutable reference to a node by handle from a raw pointer.
    ///
    /// # Safety
    /// - `ptr` must point to a valid, allocated `RawOrderedMap<K, V>`.
    /// - The caller must have logical exclusive access to the node at `handle`.
    pub(crate) unsafe fn node_mut_ptr<'a>(ptr: *mut Self, handle: Handle) -> &'a mut Node<K, V> {
        // SAFETY: Caller guarantees ptr validity and exclusive access to the node.
        unsafe { Arena::get_mut_ptr(core::ptr::addr_of_mut!((*ptr).nodes), handle) }
    }

    /// Clears all elements from the tree.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    /// Returns the entry with the minimum key.
    pub(crate) fn first(&self) -> Option<(&K, &V)> {
        let mut current = self.root?;
        while let Some(left) = self.nodes.get(current).left {
            current = left;
        }
        let node = self.nodes.get(current);
        Some((&node.key, &node.value))
    }

    /// Returns the entry with the maximum key.
    pub(crate) fn last(&self) -> Option<(&K, &V)> {
        let mut current = self.root?;
        while let Some(right) = self.nodes.get(current).right {
            current = right;
        }
        let node = self.nodes.get(current);
        Some((&node.key, &node.value))
    }

    /// Visits every entry in ascending key order.
    ///
    /// Iterative in-order traversal: push the left spine onto an explicit
    /// stack, pop and visit, then walk into the popped node's right subtree.
    /// The visitor is invoked synchronously for every element; there is no
    /// early termination.
    pub(crate) fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&K, &V),
    {
        let mut stack = TraversalStack::new();
        let mut current = self.root;

        loop {
            while let Some(handle) = current {
                stack.push(handle);
                current = self.nodes.get(handle).left;
            }
            let Some(handle) = stack.pop() else { break };
            let node = self.nodes.get(handle);
            visitor(&node.key, &node.value);
            current = node.right;
        }
    }

    /// Drains all key-value pairs from the tree in ascending key order.
    pub(crate) fn drain_to_vec(&mut self) -> alloc::vec::Vec<(K, V)> {
        let mut result = alloc::vec::Vec::with_capacity(self.len);
        let mut stack = TraversalStack::new();
        let mut current = self.root;

        loop {
            while let Some(handle) = current {
                stack.push(handle);
                current = self.nodes.get(handle).left;
            }
            let Some(handle) = stack.pop() else { break };
            let node = self.nodes.take(handle);
            result.push((node.key, node.value));
            current = node.right;
        }

        self.root = None;
        self.len = 0;
        result
    }
}

impl<K: Ord, V> RawOrderedMap<K, V> {
    /// Standard BST descent. Returns the handle holding `key`, if present.
    pub(crate) fn find<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            current = match key.cmp(node.key.borrow()) {
                Ordering::Equal => return Some(handle),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        None
    }

    /// Returns a reference to the value corresponding to the key.
    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.find(key).map(|handle| &self.nodes.get(handle).value)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let handle = self.find(key)?;
        Some(&mut self.nodes.get_mut(handle).value)
    }

    /// Returns the key-value pair corresponding to the key.
    pub(crate) fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let handle = self.find(key)?;
        let node = self.nodes.get(handle);
        Some((&node.key, &node.value))
    }

    /// Returns true if the tree contains the specified key.
    pub(crate) fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.find(key).is_some()
    }

    /// Inserts a key-value pair into the tree.
    ///
    /// An equal key overwrites its value in place and returns the previous
    /// value; `len` is unchanged. Otherwise a new node is attached at the
    /// absent child slot the descent ran into.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<V> {
        let Some(mut current) = self.root else {
            self.root = Some(self.nodes.alloc(Node::new(key, value)));
            self.len = 1;
            return None;
        };

        loop {
            let node = self.nodes.get(current);
            let side = match key.cmp(&node.key) {
                Ordering::Equal => break,
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            match node.child(side) {
                Some(child) => current = child,
                None => {
                    let child = self.nodes.alloc(Node::new(key, value));
                    self.nodes.get_mut(current).set_child(side, Some(child));
                    self.len += 1;
                    return None;
                }
            }
        }

        // Equal key: only the payload changes.
        let node = self.nodes.get_mut(current);
        Some(core::mem::replace(&mut node.value, value))
    }

    /// Inserts a key known to be absent and returns the new node's handle.
    ///
    /// Should the key be present after all, its value is overwritten and the
    /// existing handle returned, preserving the no-duplicates invariant.
    pub(crate) fn insert_vacant(&mut self, key: K, value: V) -> Handle {
        let Some(mut current) = self.root else {
            let handle = self.nodes.alloc(Node::new(key, value));
            self.root = Some(handle);
            self.len = 1;
            return handle;
        };

        loop {
            let node = self.nodes.get(current);
            let side = match key.cmp(&node.key) {
                Ordering::Equal => break,
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            match node.child(side) {
                Some(child) => current = child,
                None => {
                    let handle = self.nodes.alloc(Node::new(key, value));
                    self.nodes.get_mut(current).set_child(side, Some(handle));
                    self.len += 1;
                    return handle;
                }
            }
        }

        self.nodes.get_mut(current).value = value;
        current
    }

    /// Removes a key from the tree and returns the value.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes a key from the tree and returns the key-value pair.
    ///
    /// An absent key is a no-op: the tree and `len` are left untouched.
    pub(crate) fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        // Walk to the target, remembering the slot that references it.
        let mut parent: Option<(Handle, Side)> = None;
        let mut current = self.root?;

        loop {
            let node = self.nodes.get(current);
            let side = match key.cmp(node.key.borrow()) {
                Ordering::Equal => break,
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            parent = Some((current, side));
            current = node.child(side)?;
        }

        Some(self.splice_out(parent, current))
    }

    /// Removes the node at `target`, which must be live in this tree.
    ///
    /// The referencing slot is recovered by re-walking from the root and
    /// comparing against the target's own key; nodes store no parent links.
    pub(crate) fn remove_at(&mut self, target: Handle) -> (K, V) {
        let mut parent: Option<(Handle, Side)> = None;
        let mut current = self.root.expect("`RawOrderedMap::remove_at()` - tree is empty!");

        while current != target {
            let node = self.nodes.get(current);
            let side = if self.nodes.get(target).key < node.key {
                Side::Left
            } else {
                Side::Right
            };
            parent = Some((current, side));
            current = node
                .child(side)
                .expect("`RawOrderedMap::remove_at()` - `target` is not reachable!");
        }

        self.splice_out(parent, target)
    }

    /// Unlinks `target` from the slot that references it and returns its
    /// payload, decrementing `len` exactly once.
    fn splice_out(&mut self, parent: Option<(Handle, Side)>, target: Handle) -> (K, V) {
        let node = self.nodes.get(target);

        if let (Some(_), Some(right)) = (node.left, node.right) {
            // Two children: the in-order successor (the leftmost node of the
            // right subtree) takes over the target's payload, and the
            // successor's own node is spliced out of its slot instead. The
            // successor has no left child by construction, so its right
            // subtree (possibly absent) replaces it directly.
            let mut succ_parent = (target, Side::Right);
            let mut succ = right;
            while let Some(left) = self.nodes.get(succ).left {
                succ_parent = (succ, Side::Left);
                succ = left;
            }

            let succ_node = self.nodes.take(succ);
            self.nodes.get_mut(succ_parent.0).set_child(succ_parent.1, succ_node.right);

            let target_node = self.nodes.get_mut(target);
            let key = core::mem::replace(&mut target_node.key, succ_node.key);
            let value = core::mem::replace(&mut target_node.value, succ_node.value);
            self.len -= 1;
            (key, value)
        } else {
            // Zero or one child: the surviving subtree (possibly absent)
            // replaces the target in the referencing slot directly.
            let node = self.nodes.take(target);
            let replacement = node.left.or(node.right);
            match parent {
                Some((handle, side)) => self.nodes.get_mut(handle).set_child(side, replacement),
                None => self.root = replacement,
            }
            self.len -= 1;
            (node.key, node.value)
        }
    }
}

#[cfg(test)]
impl<K: Ord, V> RawOrderedMap<K, V> {
    /// Walks the whole tree checking the BST ordering invariant, the `len`
    /// counter, and the arena bookkeeping. Panics with a descriptive message
    /// if any are violated; intended for use in tests.
    pub(crate) fn validate_invariants(&self) {
        let Some(root) = self.root else {
            assert_eq!(self.len, 0, "empty tree must have len 0");
            assert!(self.nodes.is_empty(), "empty tree must own no nodes");
            return;
        };

        // Explicit in-order walk; consecutive keys must ascend strictly.
        let mut stack: alloc::vec::Vec<Handle> = alloc::vec::Vec::new();
        let mut current = Some(root);
        let mut prev: Option<Handle> = None;
        let mut count = 0usize;

        loop {
            while let Some(handle) = current {
                stack.push(handle);
                current = self.nodes.get(handle).left;
            }
            let Some(handle) = stack.pop() else { break };
            if let Some(prev_handle) = prev {
                assert!(
                    self.nodes.get(prev_handle).key < self.nodes.get(handle).key,
                    "in-order walk must yield strictly ascending keys"
                );
            }
            prev = Some(handle);
            count += 1;
            current = self.nodes.get(handle).right;
        }

        assert_eq!(count, self.len, "len must match the reachable node count");
        assert_eq!(self.nodes.len(), self.len, "arena must own exactly the reachable nodes");
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use proptest::prelude::*;

    use super::*;

    fn tree_from(keys: &[i32]) -> RawOrderedMap<i32, i32> {
        let mut tree = RawOrderedMap::new();
        for &key in keys {
            tree.insert(key, key * 10);
        }
        tree.validate_invariants();
        tree
    }

    fn keys_in_order(tree: &RawOrderedMap<i32, i32>) -> Vec<i32> {
        let mut keys = Vec::new();
        tree.for_each(|&key, _| keys.push(key));
        keys
    }

    #[test]
    fn remove_leaf() {
        let mut tree = tree_from(&[10, 5, 15]);
        assert_eq!(tree.remove(&5), Some(50));
        tree.validate_invariants();
        assert_eq!(keys_in_order(&tree), [10, 15]);
    }

    #[test]
    fn remove_node_with_left_child() {
        let mut tree = tree_from(&[10, 5, 2]);
        assert_eq!(tree.remove(&5), Some(50));
        tree.validate_invariants();
        assert_eq!(keys_in_order(&tree), [2, 10]);
    }

    #[test]
    fn remove_node_with_right_child() {
        let mut tree = tree_from(&[10, 5, 7]);
        assert_eq!(tree.remove(&5), Some(50));
        tree.validate_invariants();
        assert_eq!(keys_in_order(&tree), [7, 10]);
    }

    #[test]
    fn remove_node_with_two_children_adjacent_successor() {
        // 15's successor is its immediate right child 20.
        let mut tree = tree_from(&[10, 15, 12, 20, 25]);
        assert_eq!(tree.remove(&15), Some(150));
        tree.validate_invariants();
        assert_eq!(keys_in_order(&tree), [10, 12, 20, 25]);
    }

    #[test]
    fn remove_node_with_two_children_deep_successor() {
        // 10's successor is 12, two levels down the right subtree, and 12
        // itself carries a right child that must be re-attached.
        let mut tree = tree_from(&[10, 5, 20, 15, 12, 13, 25]);
        assert_eq!(tree.remove(&10), Some(100));
        tree.validate_invariants();
        assert_eq!(keys_in_order(&tree), [5, 12, 13, 15, 20, 25]);
        assert!(tree.contains_key(&13));
    }

    #[test]
    fn remove_root_in_each_shape() {
        // Leaf root.
        let mut tree = tree_from(&[10]);
        assert_eq!(tree.remove(&10), Some(100));
        tree.validate_invariants();
        assert!(tree.is_empty());

        // Root with a single child.
        let mut tree = tree_from(&[10, 5]);
        assert_eq!(tree.remove(&10), Some(100));
        tree.validate_invariants();
        assert_eq!(keys_in_order(&tree), [5]);

        // Root with two children.
        let mut tree = tree_from(&[10, 5, 15]);
        assert_eq!(tree.remove(&10), Some(100));
        tree.validate_invariants();
        assert_eq!(keys_in_order(&tree), [5, 15]);
    }

    #[test]
    fn remove_absent_key_is_a_no_op() {
        let mut tree = tree_from(&[10, 5, 15]);
        assert_eq!(tree.remove(&42), None);
        tree.validate_invariants();
        assert_eq!(tree.len(), 3);
        assert_eq!(keys_in_order(&tree), [5, 10, 15]);
    }

    #[test]
    fn insert_overwrites_in_place() {
        let mut tree = tree_from(&[10, 5, 15]);
        assert_eq!(tree.insert(5, 999), Some(50));
        tree.validate_invariants();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get(&5), Some(&999));
    }

    #[test]
    fn sorted_insertion_degrades_but_stays_correct() {
        // A list-shaped tree; traversal must not recurse, so a long spine
        // exercises the explicit stack.
        let mut tree = RawOrderedMap::new();
        for key in 0..1_000 {
            tree.insert(key, key);
        }
        tree.validate_invariants();
        let keys = keys_in_order(&tree);
        assert!(keys.iter().copied().eq(0..1_000));
    }

    #[test]
    fn remove_at_matches_remove_by_key() {
        let mut tree = tree_from(&[10, 5, 15, 2, 4, 12, 14]);
        let handle = tree.find(&5).unwrap();
        assert_eq!(tree.remove_at(handle), (5, 50));
        tree.validate_invariants();
        assert_eq!(keys_in_order(&tree), [2, 4, 10, 12, 14, 15]);
    }

    proptest! {
        #[test]
        fn random_ops_keep_invariants(operations in prop::collection::vec((any::<bool>(), -64i32..64), 0..512)) {
            let mut tree: RawOrderedMap<i32, i32> = RawOrderedMap::new();

            for (insert, key) in operations {
                if insert {
                    tree.insert(key, key);
                } else {
                    tree.remove(&key);
                }
                tree.validate_invariants();
            }
        }
    }
}
