use core::borrow::Borrow;
use core::ops::Index;

use super::TwoFourTree;
use crate::Position;
use crate::error::{Error, Result};

impl<K: Ord, V> TwoFourTree<K, V> {
    /// Returns the 1-based position of the first value stored under `key`, or `None` if the key is
    /// not present.
    ///
    /// The position is one more than the number of values whose keys are smaller than `key`, so
    /// duplicates of smaller keys push it back while duplicates of `key` itself do not.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let mut tree = TwoFourTree::new();
    /// tree.insert(10, "a");
    /// tree.insert(10, "b");
    /// tree.insert(20, "c");
    ///
    /// assert_eq!(tree.rank(&10), Some(1));
    /// assert_eq!(tree.rank(&20), Some(3));
    /// assert_eq!(tree.rank(&15), None);
    /// ```
    #[must_use]
    pub fn rank<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.rank(key)
    }

    /// Like [`rank`](Self::rank), but reports why no position was found.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyTree`] if the tree holds no values and [`Error::KeyNotFound`] if
    /// `key` is absent from a non-empty tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::{Error, TwoFourTree};
    ///
    /// let mut tree = TwoFourTree::new();
    /// assert_eq!(tree.try_rank(&1), Err(Error::EmptyTree));
    ///
    /// tree.insert(1, ());
    /// assert_eq!(tree.try_rank(&1), Ok(1));
    /// assert_eq!(tree.try_rank(&2), Err(Error::KeyNotFound));
    /// ```
    pub fn try_rank<Q>(&self, key: &Q) -> Result<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if self.is_empty() {
            return Err(Error::EmptyTree);
        }
        self.rank(key).ok_or(Error::KeyNotFound)
    }

    /// Returns the key occupying the 1-based `position` in sorted order.
    ///
    /// Returns `None` if `position` is zero or greater than [`size`](Self::size).
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let tree = TwoFourTree::from([("b", 1), ("a", 2), ("b", 3)]);
    ///
    /// assert_eq!(tree.select(1), Some(&"a"));
    /// assert_eq!(tree.select(2), Some(&"b"));
    /// assert_eq!(tree.select(3), Some(&"b"));
    /// assert_eq!(tree.select(0), None);
    /// assert_eq!(tree.select(4), None);
    /// ```
    #[must_use]
    pub fn select(&self, position: usize) -> Option<&K> {
        self.raw.select(position).map(|(element, _)| element.key())
    }

    /// Returns the key and the exact value occupying the 1-based `position` in sorted order.
    ///
    /// Positions covered by a duplicated key resolve to its values in insertion order.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let tree = TwoFourTree::from([("b", 1), ("a", 2), ("b", 3)]);
    ///
    /// assert_eq!(tree.select_entry(2), Some((&"b", &1)));
    /// assert_eq!(tree.select_entry(3), Some((&"b", &3)));
    /// ```
    #[must_use]
    pub fn select_entry(&self, position: usize) -> Option<(&K, &V)> {
        let (element, offset) = self.raw.select(position)?;
        Some((element.key(), element.values().get(offset)?))
    }

    /// Like [`select`](Self::select), but reports why no key was found.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyTree`] if the tree holds no values and [`Error::IndexOutOfRange`]
    /// if `position` is zero or greater than [`size`](Self::size).
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::{Error, TwoFourTree};
    ///
    /// let mut tree = TwoFourTree::new();
    /// assert_eq!(tree.try_select(1), Err(Error::EmptyTree));
    ///
    /// tree.insert('x', ());
    /// assert_eq!(tree.try_select(1), Ok(&'x'));
    /// assert_eq!(tree.try_select(2), Err(Error::IndexOutOfRange { index: 2, len: 1 }));
    /// ```
    pub fn try_select(&self, position: usize) -> Result<&K> {
        if self.is_empty() {
            return Err(Error::EmptyTree);
        }
        self.select(position).ok_or(Error::IndexOutOfRange {
            index: position,
            len: self.size(),
        })
    }
}

/// Indexes into the tree by position, yielding the value stored there.
///
/// # Panics
///
/// Panics if `position` is zero or greater than the tree's size.
///
/// # Examples
///
/// ```
/// use two_four_tree::{Position, TwoFourTree};
///
/// let tree = TwoFourTree::from([("a", 1), ("b", 2), ("a", 3)]);
///
/// assert_eq!(tree[Position(2)], 3);
/// assert_eq!(tree[Position(3)], 2);
/// ```
impl<K: Ord, V> Index<Position> for TwoFourTree<K, V> {
    type Output = V;

    fn index(&self, position: Position) -> &Self::Output {
        self.select_entry(position.0).map(|(_, v)| v).expect("position out of bounds")
    }
}
