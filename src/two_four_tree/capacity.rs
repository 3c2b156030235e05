use super::TwoFourTree;
use crate::raw::RawTwoFourTree;

impl<K, V> TwoFourTree<K, V> {
    /// Creates an empty tree with room for at least `capacity` nodes before its node storage
    /// reallocates.
    ///
    /// A node holds up to three keys, so `capacity` nodes hold at least `capacity` keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let tree: TwoFourTree<i32, i32> = TwoFourTree::with_capacity(32);
    /// assert!(tree.is_empty());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity) for memory allocation.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        TwoFourTree {
            raw: RawTwoFourTree::with_capacity(capacity),
        }
    }

    /// Returns the number of nodes the tree can hold without reallocating its node storage.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let tree: TwoFourTree<i32, i32> = TwoFourTree::with_capacity(32);
    /// assert_eq!(tree.capacity(), 32);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }
}
