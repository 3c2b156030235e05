//! Read-only visitors used for debugging and testing.

use alloc::vec::Vec;
use core::fmt;

use super::TwoFourTree;
use crate::raw::{Handle, RawTwoFourTree};

impl<K, V> TwoFourTree<K, V> {
    /// Returns every key in ascending order, repeated once per stored value.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let tree = TwoFourTree::from([(2, ()), (1, ()), (2, ())]);
    /// assert_eq!(tree.inorder(), [&1, &2, &2]);
    /// ```
    #[must_use]
    pub fn inorder(&self) -> Vec<&K> {
        self.iter().map(|(key, _)| key).collect()
    }

    /// Returns the keys of each node, parents before their children.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let tree: TwoFourTree<_, _> = (1..=4).map(|k| (k, ())).collect();
    /// assert_eq!(tree.preorder(), [vec![&2], vec![&1], vec![&3, &4]]);
    /// ```
    #[must_use]
    pub fn preorder(&self) -> Vec<Vec<&K>> {
        let mut out = Vec::new();
        if let Some(root) = self.raw.root() {
            visit(&self.raw, root, &mut |keys| out.push(keys), Order::Pre);
        }
        out
    }

    /// Returns the keys of each node, children before their parents.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let tree: TwoFourTree<_, _> = (1..=4).map(|k| (k, ())).collect();
    /// assert_eq!(tree.postorder(), [vec![&1], vec![&3, &4], vec![&2]]);
    /// ```
    #[must_use]
    pub fn postorder(&self) -> Vec<Vec<&K>> {
        let mut out = Vec::new();
        if let Some(root) = self.raw.root() {
            visit(&self.raw, root, &mut |keys| out.push(keys), Order::Post);
        }
        out
    }

    /// Returns a [`Display`](fmt::Display) rendering of the tree's shape.
    ///
    /// Each node is printed on its own line, indented by its depth, as its subtree value count
    /// in parentheses followed by its keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let mut tree: TwoFourTree<_, _> = (1..=4).map(|k| (k, ())).collect();
    /// tree.insert(4, ());
    /// assert_eq!(tree.dump().to_string(), "Tree is:\n(5): 2\n (1): 1\n (3): 3, 4\n");
    ///
    /// tree.clear();
    /// assert_eq!(tree.dump().to_string(), "Tree is empty\n");
    /// ```
    pub fn dump(&self) -> Dump<'_, K, V> {
        Dump { tree: &self.raw }
    }
}

impl<K: Ord, V> TwoFourTree<K, V> {
    /// Checks every structural invariant of the tree.
    ///
    /// Node shapes, key order (within nodes and against separators), non-empty value lists,
    /// cached subtree counts, parent links, and equal leaf depth are all re-derived from scratch.
    ///
    /// # Panics
    ///
    /// Panics with a list of every violation found. A tree built only through this type's API
    /// never fails the check.
    ///
    /// # Examples
    ///
    /// ```
    /// use two_four_tree::TwoFourTree;
    ///
    /// let mut tree: TwoFourTree<_, _> = (0..100).map(|k| (k % 7, k)).collect();
    /// tree.remove(&3);
    /// tree.verify();
    /// ```
    ///
    /// # Complexity
    ///
    /// O(n)
    pub fn verify(&self) {
        let violations = self.raw.violations();
        assert!(
            violations.is_empty(),
            "`TwoFourTree::verify()` - invariant violations:\n{}",
            violations.join("\n")
        );
    }
}

/// The shape of a `TwoFourTree`, formatted for display.
///
/// This `struct` is created by the [`dump`] method on [`TwoFourTree`]. See its documentation for
/// more.
///
/// [`dump`]: TwoFourTree::dump
#[must_use]
pub struct Dump<'a, K, V> {
    tree: &'a RawTwoFourTree<K, V>,
}

impl<K: fmt::Display, V> fmt::Display for Dump<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(root) = self.tree.root() else {
            return writeln!(f, "Tree is empty");
        };

        writeln!(f, "Tree is:")?;
        let mut stack = alloc::vec![(root, 0)];
        while let Some((handle, depth)) = stack.pop() {
            let node = self.tree.node(handle);
            write!(f, "{:depth$}({}): ", "", node.count())?;
            for (idx, element) in node.elements().iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", element.key())?;
            }
            f.write_str("\n")?;
            stack.extend(node.children().iter().rev().map(|&child| (child, depth + 1)));
        }
        Ok(())
    }
}

impl<K, V> fmt::Debug for Dump<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dump").finish_non_exhaustive()
    }
}

#[derive(Clone, Copy)]
enum Order {
    Pre,
    Post,
}

fn visit<'a, K, V>(tree: &'a RawTwoFourTree<K, V>, handle: Handle, emit: &mut impl FnMut(Vec<&'a K>), order: Order) {
    let node = tree.node(handle);
    let keys = || -> Vec<&'a K> { node.elements().iter().map(|e| e.key()).collect() };

    if let Order::Pre = order {
        emit(keys());
    }
    for &child in node.children() {
        visit(tree, child, emit, order);
    }
    if let Order::Post = order {
        emit(keys());
    }
}
