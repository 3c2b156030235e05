use alloc::vec::Vec;
use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;

use crate::error::{Error, Result};
use crate::raw::{Element, Handle, RawTwoFourTree};
use crate::value_list::ValueList;

mod capacity;
mod order_statistic;
mod traversal;

pub use crate::Position;
pub use traversal::Dump;

/// An ordered multimap based on a [2-4 tree].
///
/// Given a key type with a [total order], the tree stores its keys in sorted order. Inserting a
/// key that is already present does not replace anything: the value joins that key's
/// [`ValueList`] behind the values inserted before it, and [`remove`] takes them out again
/// oldest first. Every stored value occupies one 1-based *position* in the sorted sequence, so a
/// key inserted three times covers three consecutive positions.
///
/// Each node caches the number of values stored in its subtree, which makes [`rank`] and
/// [`select`] run in O(log n) without scanning any subtree.
///
/// It is a logic error for a key to be modified in such a way that the key's ordering relative to
/// any other key, as determined by the [`Ord`] trait, changes while it is in the tree. The
/// behavior resulting from such a logic error is not specified, but will be encapsulated to the
/// `TwoFourTree` that observed the logic error and not result in undefined behavior.
///
/// # Examples
///
/// ```
/// use two_four_tree::TwoFourTree;
///
/// let mut grades = TwoFourTree::new();
/// grades.insert(90, "Alice");
/// grades.insert(72, "Bob");
/// grades.insert(90, "Carol");
/// grades.insert(85, "Dave");
///
/// // Both students with 90 are kept, in insertion order.
/// assert_eq!(grades.duplicates(&90), 2);
/// assert_eq!(grades.search(&90), Some(&"Alice"));
///
/// // 72 and 85 sit below 90, so its first value is the third one.
/// assert_eq!(grades.rank(&90), Some(3));
/// assert_eq!(grades.select_entry(4), Some((&90, &"Carol")));
///
/// grades.remove(&90);
/// assert_eq!(grades.search(&90), Some(&"Carol"));
///
/// for (grade, name) in &grades {
///     println!("{name}: {grade}");
/// }
/// ```
///
/// A `TwoFourTree` with a known list of items can be initialized from an array:
///
/// ```
/// use two_four_tree::TwoFourTree;
///
/// let tree = TwoFourTree::from([(3, 'c'), (1, 'a'), (2, 'b'), (1, 'z')]);
/// assert_eq!(tree.size(), 4);
/// assert_eq!(tree.inorder(), [&1, &1, &2, &3]);
/// ```
///
/// [2-4 tree]: https://en.wikipedia.org/wiki/2%E2%80%933%E2%80%934_tree
/// [total order]: https://en.wikipedia.org/wiki/Total_order
/// [`remove`]: TwoFourTree::remove
/// [`rank`]: TwoFourTree::rank
/// [`select`]: TwoFourTree::select
pub struct TwoFourTree<K, V> {
    raw: RawTwoFourTree<K, V>,
}

/// An iterator over the entries of a `TwoFourTree`.
///
/// Yields one `(&K, &V)` pair per stored value in ascending key order; a key with several values
/// is repeated once for each, oldest value first.
///
/// This `struct` is created by the [`iter`] method on [`TwoFourTree`]. See its documentation for
/// more.
///
/// # Examples
///
/// ```
/// use two_four_tree::TwoFourTree;
///
/// let tree = TwoFourTree::from([(2, "b"), (1, "a"), (2, "c")]);
/// let mut iter = tree.iter();
/// assert_eq!(iter.len(), 3);
/// assert_eq!(iter.next(), Some((&1, &"a")));
/// assert_eq!(iter.next(), Some((&2, &"b")));
/// assert_eq!(iter.next(), Some((&2, &"c")));
/// assert_eq!(iter.next(), None);
/// ```
///
/// [`iter`]: TwoFourTree::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V> {
    tree: Option<&'a RawTwoFourTree<K, V>>,
    /// Nodes on the path to the next element, each with the index of its next unvisited element.
    stack: Vec<(Handle, usize)>,
    /// The element being yielded and the offset of its next value.
    current: Option<(&'a Element<K, V>, usize)>,
    remaining: usize,
}

impl<K, V> TwoFourTree<K, V> {
    /// Makes a new, empty `TwoFourTree`.
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let mut tree = TwoFourTree::new();
    ///
    /// // entries can now be inserted into the empty tree
    /// tree.insert(1, "a");
    /// ```
    #[must_use]
    pub const fn new() -> TwoFourTree<K, V> {
        TwoFourTree {
            raw: RawTwoFourTree::new(),
        }
    }

    /// Returns the number of values stored in the tree, counting every duplicate.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let mut tree = TwoFourTree::new();
    /// assert_eq!(tree.size(), 0);
    /// tree.insert(1, "a");
    /// tree.insert(1, "b");
    /// assert_eq!(tree.size(), 2);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn size(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the tree stores no values.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let mut tree = TwoFourTree::new();
    /// assert!(tree.is_empty());
    /// tree.insert(1, "a");
    /// assert!(!tree.is_empty());
    /// ```
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the number of levels in the tree, zero when it is empty.
    ///
    /// Every leaf sits at this depth.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let mut tree = TwoFourTree::new();
    /// assert_eq!(tree.height(), 0);
    /// for key in 0..3 {
    ///     tree.insert(key, ());
    /// }
    /// assert_eq!(tree.height(), 1);
    /// tree.insert(3, ());
    /// assert_eq!(tree.height(), 2);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Clears the tree, removing all keys and values.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let mut tree = TwoFourTree::new();
    /// tree.insert(1, "a");
    /// tree.clear();
    /// assert!(tree.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Gets an iterator over every stored value with its key, in ascending key order.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let mut tree = TwoFourTree::new();
    /// tree.insert(3, "c");
    /// tree.insert(1, "a");
    /// tree.insert(3, "d");
    ///
    /// let entries: Vec<_> = tree.iter().collect();
    /// assert_eq!(entries, [(&1, &"a"), (&3, &"c"), (&3, &"d")]);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n) to create the iterator; amortized O(1) per iteration step.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter {
            tree: Some(&self.raw),
            stack: Vec::with_capacity(self.raw.height()),
            current: None,
            remaining: self.raw.len(),
        };
        if let Some(root) = self.raw.root() {
            iter.descend_leftmost(root);
        }
        iter
    }
}

impl<K: Ord, V> TwoFourTree<K, V> {
    /// Inserts `value` under `key`.
    ///
    /// If the key is already present the value is appended behind the key's existing values and
    /// the tree's shape does not change.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let mut tree = TwoFourTree::new();
    /// tree.insert(5, "a");
    /// tree.insert(5, "b");
    /// assert_eq!(tree.duplicates(&5), 2);
    /// assert_eq!(tree.size(), 2);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, key: K, value: V) {
        self.raw.insert(key, value);
    }

    /// Removes the oldest value stored under `key`.
    ///
    /// The key itself disappears with its last value. Returns `true` if a value was removed and
    /// `false` if the key was not present.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let mut tree = TwoFourTree::new();
    /// tree.insert(5, "a");
    /// tree.insert(5, "b");
    ///
    /// assert!(tree.remove(&5));
    /// assert_eq!(tree.search(&5), Some(&"b"));
    /// assert!(tree.remove(&5));
    /// assert!(!tree.contains_key(&5));
    /// assert!(!tree.remove(&5));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove(key)
    }

    /// Returns a reference to the oldest value stored under `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let mut tree = TwoFourTree::new();
    /// tree.insert(1, "a");
    /// tree.insert(1, "b");
    /// assert_eq!(tree.search(&1), Some(&"a"));
    /// assert_eq!(tree.search(&2), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn search<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get(key).and_then(|element| element.values().front())
    }

    /// Returns the number of values stored under `key`, zero if it is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let mut tree = TwoFourTree::new();
    /// tree.insert("x", 1);
    /// tree.insert("x", 2);
    /// assert_eq!(tree.duplicates("x"), 2);
    /// assert_eq!(tree.duplicates("y"), 0);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn duplicates<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get(key).map_or(0, Element::span)
    }

    /// Returns `true` if at least one value is stored under `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let mut tree = TwoFourTree::new();
    /// tree.insert(1, "a");
    /// assert!(tree.contains_key(&1));
    /// assert!(!tree.contains_key(&2));
    /// ```
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.search(key).is_some()
    }

    /// Returns every value stored under `key`, oldest first.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let mut tree = TwoFourTree::new();
    /// tree.insert(1, 'x');
    /// tree.insert(1, 'y');
    ///
    /// let values = tree.values(&1).unwrap();
    /// assert_eq!(values.iter().collect::<Vec<_>>(), [&'x', &'y']);
    /// assert!(tree.values(&2).is_none());
    /// ```
    #[must_use]
    pub fn values<Q>(&self, key: &Q) -> Option<&ValueList<V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get(key).map(Element::values)
    }

    /// Returns the value at zero-based `index` among those stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if `key` is absent, and [`Error::IndexOutOfRange`] if the
    /// key holds `index` or fewer values.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::{Error, TwoFourTree};
    ///
    /// let mut tree = TwoFourTree::new();
    /// tree.insert(1, 'x');
    /// tree.insert(1, 'y');
    ///
    /// assert_eq!(tree.value_at(&1, 1), Ok(&'y'));
    /// assert_eq!(tree.value_at(&1, 2), Err(Error::IndexOutOfRange { index: 2, len: 2 }));
    /// assert_eq!(tree.value_at(&2, 0), Err(Error::KeyNotFound));
    /// ```
    pub fn value_at<Q>(&self, key: &Q, index: usize) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get(key).ok_or(Error::KeyNotFound)?.values().try_get(index)
    }
}

impl<K: Clone, V: Clone> Clone for TwoFourTree<K, V> {
    fn clone(&self) -> Self {
        TwoFourTree {
            raw: self.raw.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TwoFourTree<K, V> {
    /// Formats the tree as a map from each key to its list of values.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        let mut iter = self.iter();
        while let Some((key, values)) = iter.next_element() {
            map.entry(key, values);
        }
        map.finish()
    }
}

impl<K, V> Default for TwoFourTree<K, V> {
    fn default() -> Self {
        TwoFourTree::new()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for TwoFourTree<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut tree = TwoFourTree::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord, V> Extend<(K, V)> for TwoFourTree<K, V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K: Ord + Copy, V: Copy> Extend<(&'a K, &'a V)> for TwoFourTree<K, V> {
    fn extend<T: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: T) {
        for (&k, &v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V> IntoIterator for &'a TwoFourTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for TwoFourTree<K, V> {
    /// Inserts the pairs in array order, so duplicates keep their relative order.
    fn from(arr: [(K, V); N]) -> Self {
        arr.into_iter().collect()
    }
}

impl<'a, K, V> Iter<'a, K, V> {
    /// Pushes `handle` and its leftmost descendants, ending at a leaf.
    fn descend_leftmost(&mut self, mut handle: Handle) {
        let Some(tree) = self.tree else { return };
        loop {
            self.stack.push((handle, 0));
            let node = tree.node(handle);
            if node.is_leaf() {
                return;
            }
            handle = node.child(0);
        }
    }

    /// Moves to the next element in key order and returns it with its values, skipping whatever
    /// is left of the current element's values.
    fn next_element(&mut self) -> Option<(&'a K, &'a ValueList<V>)> {
        let tree = self.tree?;

        if let Some((element, offset)) = self.current.take() {
            self.remaining -= element.span() - offset;
        }

        while let Some((handle, next)) = self.stack.last_mut() {
            let node = tree.node(*handle);
            if *next == node.element_count() {
                self.stack.pop();
                continue;
            }

            let element = node.element(*next);
            *next += 1;
            if !node.is_leaf() {
                let right = node.child(*next);
                self.descend_leftmost(right);
            }
            self.current = Some((element, 0));
            return Some((element.key(), element.values()));
        }
        None
    }
}

impl<'a, K: 'a, V: 'a> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let (element, offset) = match self.current {
            Some((element, offset)) if offset < element.span() => (element, offset),
            _ => {
                self.current = None;
                self.next_element()?;
                self.current?
            }
        };

        self.current = Some((element, offset + 1));
        self.remaining -= 1;
        Some((element.key(), &element.values()[offset]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").field("remaining", &self.remaining).finish()
    }
}

impl<K, V> Default for Iter<'_, K, V> {
    /// Creates an empty `two_four_tree::Iter`.
    ///
    /// ```
    /// # use two_four_tree::two_four_tree;
    /// let iter: two_four_tree::Iter<'_, u8, u8> = Default::default();
    /// assert_eq!(iter.len(), 0);
    /// ```
    fn default() -> Self {
        Iter {
            tree: None,
            stack: Vec::new(),
            current: None,
            remaining: 0,
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            tree: self.tree,
            stack: self.stack.clone(),
            current: self.current,
            remaining: self.remaining,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::vec;

    #[test]
    fn iter_repeats_duplicates_in_insertion_order() {
        let mut tree = TwoFourTree::new();
        for key in (0..50).rev() {
            tree.insert(key % 10, key);
        }

        let mut iter = tree.iter();
        assert_eq!(iter.len(), 50);
        let first: Vec<_> = iter.by_ref().take(6).collect();
        assert_eq!(first, [(&0, &40), (&0, &30), (&0, &20), (&0, &10), (&0, &0), (&1, &41)]);
        assert_eq!(iter.len(), 44);

        let keys: Vec<i32> = tree.iter().map(|(k, _)| *k).collect();
        let mut expected: Vec<i32> = (0..50).map(|k| k % 10).collect();
        expected.sort_unstable();
        assert_eq!(keys, expected);
    }

    #[test]
    fn iter_on_empty_tree() {
        let tree: TwoFourTree<i32, i32> = TwoFourTree::new();
        let mut iter = tree.iter();
        assert_eq!(iter.len(), 0);
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn cloned_iter_is_independent() {
        let tree = TwoFourTree::from([(1, 'a'), (2, 'b'), (3, 'c')]);
        let mut iter = tree.iter();
        iter.next();
        let rest: Vec<_> = iter.clone().collect();
        assert_eq!(rest, [(&2, &'b'), (&3, &'c')]);
        assert_eq!(iter.next(), Some((&2, &'b')));
    }

    #[test]
    fn debug_groups_values_by_key() {
        let tree = TwoFourTree::from([(2, "b"), (1, "a"), (2, "c")]);
        assert_eq!(format!("{tree:?}"), r#"{1: ["a"], 2: ["b", "c"]}"#);
    }

    #[test]
    fn clone_is_deep() {
        let mut tree = TwoFourTree::from([(1, 10), (2, 20)]);
        let copy = tree.clone();
        tree.insert(3, 30);
        tree.remove(&1);

        assert_eq!(copy.iter().collect::<Vec<_>>(), vec![(&1, &10), (&2, &20)]);
        copy.verify();
    }

    #[test]
    fn extend_from_references() {
        let source = TwoFourTree::from([(1, 10), (1, 11)]);
        let mut tree: TwoFourTree<i32, i32> = TwoFourTree::new();
        tree.extend(&source);
        assert_eq!(tree.duplicates(&1), 2);
        assert_eq!(tree.value_at(&1, 1), Ok(&11));
    }
}
