/// A 1-based position into the sorted sequence of values stored in a tree.
///
/// Duplicate keys occupy one position per stored value.
///
/// # Examples
///
/// ```
/// use two_four_tree::{Position, TwoFourTree};
///
/// let mut tree = TwoFourTree::new();
/// tree.insert("b", 20);
/// tree.insert("a", 10);
///
/// assert_eq!(tree[Position(1)], 10);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Position(pub usize);
