use alloc::string::String;
use alloc::vec::Vec;
use core::borrow::Borrow;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Element, Node, SearchResult};
use crate::tracing_helpers::{debug_log, trace_log};

/// The core 2-4 tree backing `TwoFourTree`.
///
/// Every key maps to one [`Element`] holding all values inserted under it. Nodes live in an arena
/// and link to their parent by handle; those links are only followed upward while rebalancing or
/// adjusting counts.
#[derive(Clone)]
pub(crate) struct RawTwoFourTree<K, V> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K, V>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
}

impl<K, V> RawTwoFourTree<K, V> {
    /// Creates a new, empty tree.
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
        }
    }

    /// Creates a new tree with room for `capacity` nodes.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: None,
        }
    }

    /// Returns the number of values stored in the tree.
    pub(crate) fn len(&self) -> usize {
        self.root.map_or(0, |root| self.nodes.get(root).count())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the node capacity of the arena.
    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    pub(crate) fn root(&self) -> Option<Handle> {
        self.root
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V> {
        self.nodes.get(handle)
    }

    /// Number of levels; zero for an empty tree.
    pub(crate) fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(handle) = current {
            height += 1;
            current = self.nodes.get(handle).children().first().copied();
        }
        height
    }

    /// Adds `amount` to the count of `from` and every ancestor.
    fn add_count_upward(&mut self, from: Handle, amount: usize) {
        let mut current = Some(from);
        while let Some(handle) = current {
            let node = self.nodes.get_mut(handle);
            node.add_count(amount);
            current = node.parent();
        }
    }

    /// Subtracts `amount` from the count of `from` and every ancestor below `stop`.
    ///
    /// With `stop == None` the walk continues through the root.
    fn sub_count_upward(&mut self, from: Handle, stop: Option<Handle>, amount: usize) {
        let mut current = Some(from);
        while current != stop {
            let Some(handle) = current else { break };
            let node = self.nodes.get_mut(handle);
            node.sub_count(amount);
            current = node.parent();
        }
    }

    fn set_parent_of_children(&mut self, parent: Handle, children: &[Handle]) {
        for &child in children {
            self.nodes.get_mut(child).set_parent(Some(parent));
        }
    }

    /// Recomputes a node's count from its elements and its children's counts.
    fn recount(&mut self, handle: Handle) {
        let node = self.nodes.get(handle);
        let count = node.own_count() + node.children().iter().map(|&c| self.nodes.get(c).count()).sum::<usize>();
        self.nodes.get_mut(handle).set_count(count);
    }
}

impl<K: Ord, V> RawTwoFourTree<K, V> {
    /// Finds the node and element index holding `key`.
    pub(crate) fn search<Q>(&self, key: &Q) -> Option<(Handle, usize)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root?;

        loop {
            let node = self.nodes.get(current);
            match node.search(key) {
                SearchResult::Found(idx) => return Some((current, idx)),
                SearchResult::NotFound(_) if node.is_leaf() => return None,
                SearchResult::NotFound(idx) => current = node.child(idx),
            }
        }
    }

    /// Returns the element stored under `key`.
    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&Element<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (handle, idx) = self.search(key)?;
        Some(self.nodes.get(handle).element(idx))
    }

    /// Inserts `value` under `key`.
    ///
    /// Every full node met on the way down is split before it is examined, so the leaf reached at
    /// the bottom always has room and no split ever has to travel back up. An existing key is
    /// recognised at whatever level it is met and only gains a value.
    pub(crate) fn insert(&mut self, key: K, value: V) {
        let Some(root) = self.root else {
            let leaf = self.nodes.alloc(Node::new_leaf(Element::new(key, value)));
            self.root = Some(leaf);
            return;
        };

        let mut current = if self.nodes.get(root).is_full() {
            self.split_root(root)
        } else {
            root
        };

        loop {
            let node = self.nodes.get(current);
            let idx = match node.search(&key) {
                SearchResult::Found(idx) => {
                    self.nodes.get_mut(current).element_mut(idx).push_value(value);
                    self.add_count_upward(current, 1);
                    return;
                }
                SearchResult::NotFound(idx) => idx,
            };

            if node.is_leaf() {
                self.nodes.get_mut(current).insert_element(idx, Element::new(key, value));
                self.add_count_upward(current, 1);
                return;
            }

            let mut child = node.child(idx);
            if self.nodes.get(child).is_full() {
                let right = self.split_child(current, idx);
                // The median now sits at `idx` in `current` and separates `child` from `right`.
                match key.cmp(self.nodes.get(current).element(idx).key()) {
                    core::cmp::Ordering::Equal => {
                        self.nodes.get_mut(current).element_mut(idx).push_value(value);
                        self.add_count_upward(current, 1);
                        return;
                    }
                    core::cmp::Ordering::Greater => child = right,
                    core::cmp::Ordering::Less => {}
                }
            }
            current = child;
        }
    }

    /// Grows the tree by one level by splitting the full root. Returns the new root.
    fn split_root(&mut self, old_root: Handle) -> Handle {
        let count = self.nodes.get(old_root).count();
        let new_root = self.nodes.alloc(Node::new_root_above(old_root, count));
        self.nodes.get_mut(old_root).set_parent(Some(new_root));
        self.root = Some(new_root);
        self.split_child(new_root, 0);
        trace_log!(?old_root, ?new_root, "split root");
        new_root
    }

    /// Splits the full child at `idx` of `parent`, moving its median into `parent` and its right
    /// half into a new sibling at `idx + 1`. Returns the new sibling.
    ///
    /// `parent` must have room for one more element; its own count does not change.
    fn split_child(&mut self, parent: Handle, idx: usize) -> Handle {
        let child = self.nodes.get(parent).child(idx);
        let (median, right) = self.nodes.get_mut(child).split();
        let moved: SmallChildren = right.children().iter().copied().collect();

        let right = self.nodes.alloc(right);
        self.set_parent_of_children(right, &moved);
        self.recount(child);
        self.recount(right);

        let parent_node = self.nodes.get_mut(parent);
        parent_node.insert_element(idx, median);
        parent_node.insert_child(idx + 1, right);

        trace_log!(?parent, ?child, ?right, "split node");
        right
    }

    /// Removes one value stored under `key`, the oldest one first.
    ///
    /// Before descending into any non-root single-element node the node is widened by borrowing
    /// from or merging with a sibling, so the final removal never leaves a node empty and nothing
    /// has to be repaired on the way back up.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let Some(mut current) = self.root else {
            return false;
        };

        loop {
            if self.nodes.get(current).parent().is_some() && self.nodes.get(current).is_two_node() {
                self.widen(current);
            }

            let node = self.nodes.get(current);
            match node.search(key) {
                SearchResult::Found(idx) => {
                    self.remove_found(current, idx, key);
                    return true;
                }
                SearchResult::NotFound(_) if node.is_leaf() => return false,
                SearchResult::NotFound(idx) => current = node.child(idx),
            }
        }
    }

    /// Removes one value of the element at `idx` in `holder`.
    fn remove_found<Q>(&mut self, holder: Handle, idx: usize, key: &Q)
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let node = self.nodes.get_mut(holder);
        if node.element(idx).span() > 1 {
            node.element_mut(idx).pop_value();
            self.sub_count_upward(holder, None, 1);
            return;
        }

        if node.is_leaf() {
            self.remove_from_leaf(holder, idx);
        } else {
            self.remove_internal(holder, idx, key);
        }
    }

    /// Drops the element at `idx` of a leaf that is either the root or holds at least two elements.
    fn remove_from_leaf(&mut self, leaf: Handle, idx: usize) {
        let node = self.nodes.get_mut(leaf);
        node.remove_element(idx);

        if node.element_count() == 0 {
            debug_assert_eq!(self.root, Some(leaf), "only the root may be emptied");
            self.clear();
            return;
        }
        self.sub_count_upward(leaf, None, 1);
    }

    /// Deletes the last value of an element stored in an internal node by replacing the element
    /// with its in-order predecessor.
    ///
    /// Widening the nodes on the path to the predecessor can pull the target element down out of
    /// `holder`, or free `holder` outright when the root collapses. No handle is trusted across a
    /// widening: the target is looked up again by key after each one.
    fn remove_internal<Q>(&mut self, mut holder: Handle, mut idx: usize, key: &Q)
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        loop {
            let left = self.nodes.get(holder).child(idx);
            if !self.nodes.get(left).is_two_node() {
                break;
            }
            self.widen(left);

            (holder, idx) = self.search(key).expect("widening never drops an element");
            if self.nodes.get(holder).is_leaf() {
                // The target was pulled down into a leaf that now has room to lose it.
                self.remove_from_leaf(holder, idx);
                return;
            }
        }

        // Only separators of nodes below `holder` move from here on, so `(holder, idx)` is stable.
        let mut pred = self.nodes.get(holder).child(idx);
        while !self.nodes.get(pred).is_leaf() {
            let next = self.nodes.get(pred).last_child();
            if self.nodes.get(next).is_two_node() {
                self.widen(next);
            }
            pred = next;
        }

        let replacement = self.nodes.get_mut(pred).pop_element();
        let moved = replacement.span();
        self.nodes.get_mut(holder).replace_element(idx, replacement);

        // The predecessor's values left every subtree strictly below `holder` on its path; from
        // `holder` up, only the deleted value is gone.
        self.sub_count_upward(pred, Some(holder), moved);
        self.sub_count_upward(holder, None, 1);
        trace_log!(?holder, ?pred, "swapped in predecessor");
    }

    /// Gives the non-root single-element node `node` at least two elements, restructuring its
    /// parent and one sibling. `node` itself always survives and keeps its handle.
    fn widen(&mut self, node: Handle) {
        let parent = self.nodes.get(node).parent().expect("`widen()` - root cannot be widened");
        let parent_node = self.nodes.get(parent);
        let idx = parent_node.child_index(node);

        if parent_node.is_two_node() {
            let sibling = parent_node.child(1 - idx);
            if self.nodes.get(sibling).is_two_node() {
                self.collapse_root(node, idx, parent, sibling);
                return;
            }
        }

        if idx + 1 < parent_node.children().len() {
            let right = parent_node.child(idx + 1);
            if self.nodes.get(right).is_two_node() {
                self.merge_right(node, idx, parent, right);
            } else {
                self.rotate_from_right(node, idx, parent, right);
            }
        } else {
            let left = parent_node.child(idx - 1);
            if self.nodes.get(left).is_two_node() {
                self.merge_left(node, idx, parent, left);
            } else {
                self.rotate_from_left(node, idx, parent, left);
            }
        }
    }

    /// Fuses a single-element root and its two single-element children into `node`, which
    /// becomes the new root.
    fn collapse_root(&mut self, node: Handle, idx: usize, parent: Handle, sibling: Handle) {
        debug_assert!(self.nodes.get(parent).parent().is_none(), "only the root can be a 2-node parent");

        let mut parent_node = self.nodes.take(parent);
        let separator = parent_node.pop_element();
        let sibling_node = self.nodes.take(sibling);
        let adopted: SmallChildren = sibling_node.children().iter().copied().collect();

        let node_mut = self.nodes.get_mut(node);
        if idx == 0 {
            node_mut.absorb_right(separator, sibling_node);
        } else {
            node_mut.absorb_left(sibling_node, separator);
        }
        node_mut.set_parent(None);
        self.set_parent_of_children(node, &adopted);
        self.root = Some(node);

        debug_log!(?node, "collapsed root");
    }

    /// Pulls the separator at `idx` of `parent` down into `node` and the smallest element of
    /// `right` up in its place; `right`'s leftmost child moves across to `node`.
    fn rotate_from_right(&mut self, node: Handle, idx: usize, parent: Handle, right: Handle) {
        let right_node = self.nodes.get_mut(right);
        let lifted = right_node.remove_element(0);
        let moved_child = (!right_node.is_leaf()).then(|| right_node.remove_child(0));
        let lifted_span = lifted.span();

        let separator = self.nodes.get_mut(parent).replace_element(idx, lifted);
        let mut delta = separator.span();
        self.nodes.get_mut(node).push_element(separator);

        let mut child_count = 0;
        if let Some(child) = moved_child {
            child_count = self.nodes.get(child).count();
            delta += child_count;
            self.nodes.get_mut(child).set_parent(Some(node));
            self.nodes.get_mut(node).push_child(child);
        }

        self.nodes.get_mut(node).add_count(delta);
        self.nodes.get_mut(right).sub_count(lifted_span + child_count);
        trace_log!(?node, ?right, "rotated from right");
    }

    /// Mirror of [`rotate_from_right`](Self::rotate_from_right) using the left sibling.
    fn rotate_from_left(&mut self, node: Handle, idx: usize, parent: Handle, left: Handle) {
        let left_node = self.nodes.get_mut(left);
        let lifted = left_node.pop_element();
        let moved_child = (!left_node.is_leaf()).then(|| left_node.pop_child());
        let lifted_span = lifted.span();

        let separator = self.nodes.get_mut(parent).replace_element(idx - 1, lifted);
        let mut delta = separator.span();
        self.nodes.get_mut(node).push_element_front(separator);

        let mut child_count = 0;
        if let Some(child) = moved_child {
            child_count = self.nodes.get(child).count();
            delta += child_count;
            self.nodes.get_mut(child).set_parent(Some(node));
            self.nodes.get_mut(node).push_child_front(child);
        }

        self.nodes.get_mut(node).add_count(delta);
        self.nodes.get_mut(left).sub_count(lifted_span + child_count);
        trace_log!(?node, ?left, "rotated from left");
    }

    /// Merges `node`, the separator at `idx` of `parent`, and the single-element `right` sibling.
    fn merge_right(&mut self, node: Handle, idx: usize, parent: Handle, right: Handle) {
        let parent_node = self.nodes.get_mut(parent);
        let separator = parent_node.remove_element(idx);
        parent_node.remove_child(idx + 1);

        let right_node = self.nodes.take(right);
        let adopted: SmallChildren = right_node.children().iter().copied().collect();
        self.nodes.get_mut(node).absorb_right(separator, right_node);
        self.set_parent_of_children(node, &adopted);
        trace_log!(?node, ?right, "merged with right");
    }

    /// Merges the single-element `left` sibling, the separator before `node`, and `node`.
    fn merge_left(&mut self, node: Handle, idx: usize, parent: Handle, left: Handle) {
        let parent_node = self.nodes.get_mut(parent);
        let separator = parent_node.remove_element(idx - 1);
        parent_node.remove_child(idx - 1);

        let left_node = self.nodes.take(left);
        let adopted: SmallChildren = left_node.children().iter().copied().collect();
        self.nodes.get_mut(node).absorb_left(left_node, separator);
        self.set_parent_of_children(node, &adopted);
        trace_log!(?node, ?left, "merged with left");
    }

    /// Returns the 1-based position of the first value stored under `key`.
    ///
    /// The position is one more than the number of values whose keys are smaller, accumulated from
    /// the counts of everything left of the descent path.
    pub(crate) fn rank<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root?;
        let mut before = 0;

        loop {
            let node = self.nodes.get(current);
            let (idx, found) = match node.search(key) {
                SearchResult::Found(idx) => (idx, true),
                SearchResult::NotFound(idx) => (idx, false),
            };

            before += node.elements()[..idx].iter().map(Element::span).sum::<usize>();
            if !node.is_leaf() {
                before += node.children()[..idx].iter().map(|&c| self.nodes.get(c).count()).sum::<usize>();
            }

            if found {
                if !node.is_leaf() {
                    before += self.nodes.get(node.child(idx)).count();
                }
                return Some(before + 1);
            }
            if node.is_leaf() {
                return None;
            }
            current = node.child(idx);
        }
    }

    /// Returns the element covering 1-based `position` and the offset of that position within
    /// the element's value list.
    pub(crate) fn select(&self, position: usize) -> Option<(&Element<K, V>, usize)> {
        if position == 0 || position > self.len() {
            return None;
        }

        let mut current = self.root?;
        // 1-based position within the subtree rooted at `current`.
        let mut remaining = position;

        'descend: loop {
            let node = self.nodes.get(current);
            for (idx, element) in node.elements().iter().enumerate() {
                if !node.is_leaf() {
                    let child = node.child(idx);
                    let child_count = self.nodes.get(child).count();
                    if remaining <= child_count {
                        current = child;
                        continue 'descend;
                    }
                    remaining -= child_count;
                }

                if remaining <= element.span() {
                    return Some((element, remaining - 1));
                }
                remaining -= element.span();
            }

            if node.is_leaf() {
                debug_assert!(false, "select: count invariant violated - position {position} not covered");
                return None;
            }
            current = node.last_child();
        }
    }
}

type SmallChildren = smallvec::SmallVec<[Handle; super::node::MAX_CHILDREN]>;

impl<K: Ord, V> RawTwoFourTree<K, V> {
    /// Checks every structural invariant and returns a description of each violation found.
    pub(crate) fn violations(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let Some(root) = self.root else {
            if !self.nodes.is_empty() {
                errors.push(alloc::format!("empty tree still owns {} nodes", self.nodes.len()));
            }
            return errors;
        };

        if let Some(parent) = self.nodes.get(root).parent() {
            errors.push(alloc::format!("root {root:?} has parent {parent:?}"));
        }

        let mut leaf_depth = None;
        let mut reachable = 0;
        self.check_node(root, 0, &mut leaf_depth, &mut reachable, &mut errors);

        if reachable != self.nodes.len() {
            errors.push(alloc::format!(
                "arena holds {} nodes but only {reachable} are reachable from the root",
                self.nodes.len()
            ));
        }
        errors
    }

    fn check_node(
        &self,
        handle: Handle,
        depth: usize,
        leaf_depth: &mut Option<usize>,
        reachable: &mut usize,
        errors: &mut Vec<String>,
    ) {
        *reachable += 1;
        let node = self.nodes.get(handle);

        let elements = node.element_count();
        if !(1..=3).contains(&elements) {
            errors.push(alloc::format!("node {handle:?} has {elements} elements"));
        }
        if !node.is_leaf() && node.children().len() != elements + 1 {
            errors.push(alloc::format!(
                "node {handle:?} has {elements} elements but {} children",
                node.children().len()
            ));
        }

        for pair in node.elements().windows(2) {
            if pair[0].key() >= pair[1].key() {
                errors.push(alloc::format!("keys of node {handle:?} are not strictly increasing"));
            }
        }
        for (idx, element) in node.elements().iter().enumerate() {
            if element.span() == 0 {
                errors.push(alloc::format!("element {idx} of node {handle:?} has no values"));
            }
        }

        let mut count = node.own_count();
        for (idx, &child) in node.children().iter().enumerate() {
            let child_node = self.nodes.get(child);
            if child_node.parent() != Some(handle) {
                errors.push(alloc::format!(
                    "child {idx} of node {handle:?} points to parent {:?}",
                    child_node.parent()
                ));
            }
            let (first, last) = (child_node.elements().first(), child_node.elements().last());
            if let (Some(separator), Some(first)) = (idx.checked_sub(1).and_then(|i| node.elements().get(i)), first)
                && first.key() <= separator.key()
            {
                errors.push(alloc::format!("child {idx} of node {handle:?} is not right of its separator"));
            }
            if let (Some(separator), Some(last)) = (node.elements().get(idx), last)
                && last.key() >= separator.key()
            {
                errors.push(alloc::format!("child {idx} of node {handle:?} is not left of its separator"));
            }
            count += child_node.count();
            self.check_node(child, depth + 1, leaf_depth, reachable, errors);
        }

        if node.count() != count {
            errors.push(alloc::format!(
                "count mismatch at node {handle:?}: stored={}, computed={count}",
                node.count()
            ));
        }

        if node.is_leaf() {
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    errors.push(alloc::format!(
                        "leaf {handle:?} at depth {depth}, expected {expected}"
                    ));
                }
                Some(_) => {}
            }
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;
    use alloc::vec;
    use proptest::prelude::*;

    impl<K: Ord + core::fmt::Debug, V> RawTwoFourTree<K, V> {
        /// Panics with every violated invariant.
        fn validate_invariants(&self) {
            let errors = self.violations();
            assert!(errors.is_empty(), "Tree invariant violations:\n{}", errors.join("\n"));
        }

        /// Keys in order, each repeated once per stored value.
        fn flatten(&self) -> Vec<&K> {
            (1..=self.len()).map(|p| self.select(p).unwrap().0.key()).collect()
        }
    }

    fn node_keys<V>(tree: &RawTwoFourTree<i32, V>, handle: Handle) -> Vec<i32> {
        tree.node(handle).elements().iter().map(|e| *e.key()).collect()
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i32),
        Remove(i32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0i32..200).prop_map(Op::Insert),
            2 => (0i32..200).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn tree_invariants_maintained_after_operations(ops in prop::collection::vec(op_strategy(), 0..600)) {
            let mut tree: RawTwoFourTree<i32, i32> = RawTwoFourTree::new();
            // key -> number of stored values
            let mut model: BTreeMap<i32, usize> = BTreeMap::new();

            for (step, op) in ops.into_iter().enumerate() {
                match op {
                    Op::Insert(key) => {
                        tree.insert(key, step as i32);
                        *model.entry(key).or_default() += 1;
                    }
                    Op::Remove(key) => {
                        let expected = match model.get_mut(&key) {
                            Some(n) if *n > 1 => { *n -= 1; true }
                            Some(_) => { model.remove(&key); true }
                            None => false,
                        };
                        prop_assert_eq!(tree.remove(&key), expected);
                    }
                }
                tree.validate_invariants();
                prop_assert_eq!(tree.len(), model.values().sum::<usize>());
            }

            for (key, &n) in &model {
                prop_assert_eq!(tree.get(key).map(|e| e.span()), Some(n));
            }
        }

        #[test]
        fn rank_and_select_agree(keys in prop::collection::vec(0i32..100, 1..300)) {
            let mut tree: RawTwoFourTree<i32, ()> = RawTwoFourTree::new();
            for &key in &keys {
                tree.insert(key, ());
            }
            tree.validate_invariants();

            let mut sorted = keys.clone();
            sorted.sort_unstable();
            prop_assert_eq!(tree.flatten(), sorted.iter().collect::<Vec<_>>());

            for &key in &keys {
                let rank = tree.rank(&key).unwrap();
                prop_assert_eq!(rank, sorted.partition_point(|&k| k < key) + 1);
                prop_assert_eq!(tree.select(rank).map(|(e, offset)| (*e.key(), offset)), Some((key, 0)));
            }
            prop_assert!(tree.select(0).is_none());
            prop_assert!(tree.select(keys.len() + 1).is_none());
        }

        #[test]
        fn remove_every_key_in_any_order(keys in Just((0..100).collect::<Vec<i32>>()).prop_shuffle(),
                                         order in Just((0..100).collect::<Vec<i32>>()).prop_shuffle()) {
            let mut tree: RawTwoFourTree<i32, i32> = RawTwoFourTree::new();
            for (n, &key) in keys.iter().enumerate() {
                tree.insert(key, key);
                tree.validate_invariants();
                prop_assert_eq!(tree.len(), n + 1);
            }

            for (n, key) in order.iter().enumerate() {
                prop_assert!(tree.remove(key));
                tree.validate_invariants();
                prop_assert_eq!(tree.len(), keys.len() - n - 1);
                prop_assert!(tree.search(key).is_none());
            }
            prop_assert!(tree.is_empty());
            prop_assert_eq!(tree.nodes.len(), 0);
        }
    }

    #[test]
    fn empty_tree_queries() {
        let mut tree: RawTwoFourTree<i32, i32> = RawTwoFourTree::new();
        tree.validate_invariants();

        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 0);
        assert!(tree.search(&1).is_none());
        assert!(tree.rank(&1).is_none());
        assert!(tree.select(1).is_none());
        assert!(!tree.remove(&1));
    }

    #[test]
    fn split_root_on_fourth_key() {
        let mut tree: RawTwoFourTree<i32, i32> = RawTwoFourTree::new();
        for key in [10, 20, 30] {
            tree.insert(key, key);
        }
        assert_eq!(tree.height(), 1);

        tree.insert(40, 40);
        tree.validate_invariants();
        let root = tree.root().unwrap();
        assert_eq!(node_keys(&tree, root), vec![20]);
        let children = tree.node(root).children().to_vec();
        assert_eq!(node_keys(&tree, children[0]), vec![10]);
        assert_eq!(node_keys(&tree, children[1]), vec![30, 40]);
        assert_eq!(tree.node(children[1]).count(), 2);
        assert_eq!(tree.node(root).count(), 4);
    }

    #[test]
    fn duplicate_found_at_split_median() {
        let mut tree: RawTwoFourTree<i32, char> = RawTwoFourTree::new();
        for key in 1..=7 {
            tree.insert(key, 'a');
        }
        // Root [2, 4] over [1], [3], [5, 6, 7]: the full leaf splits on the way down and its
        // median 6 lands in the root, where the duplicate is recorded.
        tree.insert(6, 'b');
        tree.validate_invariants();

        let (holder, idx) = tree.search(&6).unwrap();
        assert_eq!(Some(holder), tree.root());
        assert_eq!(node_keys(&tree, holder), vec![2, 4, 6]);
        assert_eq!(tree.node(holder).element(idx).span(), 2);
        assert_eq!(tree.len(), 8);
    }

    #[test]
    fn root_collapses_when_children_are_minimal() {
        let mut tree: RawTwoFourTree<i32, i32> = RawTwoFourTree::new();
        for key in [1, 2, 3, 4] {
            tree.insert(key, key);
        }
        assert!(tree.remove(&4));
        assert_eq!(tree.height(), 2);

        // Root [2] over [1] and [3]: deleting 1 fuses all three into a single leaf.
        assert!(tree.remove(&1));
        tree.validate_invariants();
        assert_eq!(tree.height(), 1);
        assert_eq!(node_keys(&tree, tree.root().unwrap()), vec![2, 3]);
    }

    #[test]
    fn internal_delete_with_duplicated_predecessor() {
        let mut tree: RawTwoFourTree<i32, i32> = RawTwoFourTree::new();
        for key in 0..20 {
            tree.insert(key, key);
        }
        let root_key = *tree.node(tree.root().unwrap()).element(0).key();
        let predecessor = root_key - 1;
        for n in 0..4 {
            tree.insert(predecessor, 100 + n);
        }
        tree.validate_invariants();

        assert!(tree.remove(&root_key));
        tree.validate_invariants();
        assert!(tree.search(&root_key).is_none());
        assert_eq!(tree.get(&predecessor).unwrap().span(), 5);
        assert_eq!(tree.rank(&(root_key + 1)), Some(usize::try_from(root_key).unwrap() + 5));
        assert_eq!(tree.len(), 23);
    }

    #[test]
    fn removing_duplicate_keeps_structure() {
        let mut tree: RawTwoFourTree<i32, &str> = RawTwoFourTree::new();
        tree.insert(5, "a");
        tree.insert(5, "b");
        tree.insert(7, "c");

        assert!(tree.remove(&5));
        tree.validate_invariants();
        let element = tree.get(&5).unwrap();
        assert_eq!(element.span(), 1);
        assert_eq!(element.values().front(), Some(&"b"));
        assert_eq!(tree.rank(&7), Some(2));
    }

    #[test]
    fn violations_are_reported() {
        let mut tree: RawTwoFourTree<i32, i32> = RawTwoFourTree::new();
        for key in 0..10 {
            tree.insert(key, key);
        }
        let root = tree.root().unwrap();
        tree.nodes.get_mut(root).add_count(3);

        let errors = tree.violations();
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].starts_with("count mismatch"));
    }
}
