use core::borrow::Borrow;

use smallvec::SmallVec;

use super::handle::Handle;
use crate::value_list::ValueList;

/// A node holds at most three elements (a "4-node").
pub(crate) const MAX_ELEMENTS: usize = 3;
/// An internal node has one more child than it has elements.
pub(crate) const MAX_CHILDREN: usize = MAX_ELEMENTS + 1;

/// A key together with every value stored under it, oldest first.
///
/// An element never exists with an empty value list; it is dropped together with its last value.
#[derive(Clone)]
pub(crate) struct Element<K, V> {
    key: K,
    values: ValueList<V>,
}

impl<K, V> Element<K, V> {
    pub(crate) fn new(key: K, value: V) -> Self {
        let mut values = ValueList::new();
        values.push_back(value);
        Self { key, values }
    }

    #[inline]
    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    pub(crate) fn values(&self) -> &ValueList<V> {
        &self.values
    }

    /// Number of values stored under this key.
    #[inline]
    pub(crate) fn span(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn push_value(&mut self, value: V) {
        self.values.push_back(value);
    }

    /// Removes the oldest value. The caller must not leave the element empty.
    pub(crate) fn pop_value(&mut self) -> Option<V> {
        debug_assert!(self.span() > 1, "`Element::pop_value()` - would empty the element!");
        self.values.pop_front()
    }
}

/// A 2-4 tree node.
///
/// `count` caches the number of values stored in the subtree rooted here (the spans of this node's
/// elements plus every child's `count`); rank and select descend using it alone.
#[derive(Clone)]
pub(crate) struct Node<K, V> {
    elements: SmallVec<[Element<K, V>; MAX_ELEMENTS]>,
    children: SmallVec<[Handle; MAX_CHILDREN]>,
    parent: Option<Handle>,
    count: usize,
}

/// Result of searching for a key in a node.
pub(crate) enum SearchResult {
    /// Key was found at the given element index.
    Found(usize),
    /// Key was not found; index is the child to descend into (or the insertion point in a leaf).
    NotFound(usize),
}

impl<K, V> Node<K, V> {
    /// Creates a parentless leaf holding a single element, the first root of a tree.
    pub(crate) fn new_leaf(element: Element<K, V>) -> Self {
        let count = element.span();
        let mut elements = SmallVec::new();
        elements.push(element);
        Self {
            elements,
            children: SmallVec::new(),
            parent: None,
            count,
        }
    }

    /// Creates an element-less internal node whose only child is `child`.
    ///
    /// Used to grow the tree by one level; the caller immediately splits `child` into it.
    pub(crate) fn new_root_above(child: Handle, count: usize) -> Self {
        let mut children = SmallVec::new();
        children.push(child);
        Self {
            elements: SmallVec::new(),
            children,
            parent: None,
            count,
        }
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns true for a single-element node, the shape deletion must not descend into.
    #[inline]
    pub(crate) fn is_two_node(&self) -> bool {
        self.elements.len() == 1
    }

    /// Returns true for a three-element node, the shape insertion must split before using.
    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.elements.len() == MAX_ELEMENTS
    }

    #[inline]
    pub(crate) fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub(crate) fn elements(&self) -> &[Element<K, V>] {
        &self.elements
    }

    #[inline]
    pub(crate) fn element(&self, index: usize) -> &Element<K, V> {
        &self.elements[index]
    }

    #[inline]
    pub(crate) fn element_mut(&mut self, index: usize) -> &mut Element<K, V> {
        &mut self.elements[index]
    }

    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    pub(crate) fn last_child(&self) -> Handle {
        *self.children.last().expect("`Node::last_child()` - node is a leaf!")
    }

    /// Position of `child` among this node's children.
    pub(crate) fn child_index(&self, child: Handle) -> usize {
        self.children
            .iter()
            .position(|&h| h == child)
            .expect("`Node::child_index()` - `child` is not a child of this node!")
    }

    pub(crate) fn parent(&self) -> Option<Handle> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        self.parent = parent;
    }

    #[inline]
    pub(crate) fn count(&self) -> usize {
        self.count
    }

    pub(crate) fn set_count(&mut self, count: usize) {
        self.count = count;
    }

    pub(crate) fn add_count(&mut self, amount: usize) {
        self.count += amount;
    }

    pub(crate) fn sub_count(&mut self, amount: usize) {
        debug_assert!(self.count >= amount, "`Node::sub_count()` - count underflow!");
        self.count -= amount;
    }

    /// Sum of the spans of this node's own elements, excluding children.
    pub(crate) fn own_count(&self) -> usize {
        self.elements.iter().map(Element::span).sum()
    }

    /// Finds the first element whose key is `>= key`.
    #[inline]
    pub(crate) fn search<Q>(&self, key: &Q) -> SearchResult
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.elements.binary_search_by(|e| e.key.borrow().cmp(key)) {
            Ok(idx) => SearchResult::Found(idx),
            Err(idx) => SearchResult::NotFound(idx),
        }
    }

    pub(crate) fn insert_element(&mut self, index: usize, element: Element<K, V>) {
        debug_assert!(self.elements.len() < MAX_ELEMENTS, "`Node::insert_element()` - node is full!");
        self.elements.insert(index, element);
    }

    pub(crate) fn remove_element(&mut self, index: usize) -> Element<K, V> {
        self.elements.remove(index)
    }

    pub(crate) fn replace_element(&mut self, index: usize, element: Element<K, V>) -> Element<K, V> {
        core::mem::replace(&mut self.elements[index], element)
    }

    pub(crate) fn push_element(&mut self, element: Element<K, V>) {
        self.elements.push(element);
    }

    pub(crate) fn push_element_front(&mut self, element: Element<K, V>) {
        self.elements.insert(0, element);
    }

    pub(crate) fn pop_element(&mut self) -> Element<K, V> {
        self.elements.pop().expect("`Node::pop_element()` - node has no elements!")
    }

    pub(crate) fn insert_child(&mut self, index: usize, child: Handle) {
        self.children.insert(index, child);
    }

    pub(crate) fn remove_child(&mut self, index: usize) -> Handle {
        self.children.remove(index)
    }

    pub(crate) fn push_child(&mut self, child: Handle) {
        self.children.push(child);
    }

    pub(crate) fn push_child_front(&mut self, child: Handle) {
        self.children.insert(0, child);
    }

    pub(crate) fn pop_child(&mut self) -> Handle {
        self.children.pop().expect("`Node::pop_child()` - node is a leaf!")
    }

    /// Splits a full node around its median.
    ///
    /// This node keeps the smallest element and the two leftmost children; the returned node
    /// takes the largest element and the two rightmost children. The caller must reparent the
    /// moved children and fix both counts.
    pub(crate) fn split(&mut self) -> (Element<K, V>, Node<K, V>) {
        debug_assert!(self.is_full(), "`Node::split()` - node is not full!");

        let mut right = Node {
            elements: self.elements.drain(2..).collect(),
            children: SmallVec::new(),
            parent: self.parent,
            count: 0,
        };
        if !self.is_leaf() {
            right.children = self.children.drain(2..).collect();
        }
        let median = self.pop_element();

        (median, right)
    }

    /// Appends `separator` and then all of `right`'s elements and children.
    ///
    /// The caller must reparent the adopted children.
    pub(crate) fn absorb_right(&mut self, separator: Element<K, V>, mut right: Node<K, V>) {
        self.count += separator.span() + right.count;
        self.elements.push(separator);
        self.elements.append(&mut right.elements);
        self.children.append(&mut right.children);
    }

    /// Prepends all of `left`'s elements and children followed by `separator`.
    ///
    /// The caller must reparent the adopted children.
    pub(crate) fn absorb_left(&mut self, mut left: Node<K, V>, separator: Element<K, V>) {
        self.count += left.count + separator.span();
        left.elements.push(separator);
        left.elements.append(&mut self.elements);
        left.children.append(&mut self.children);
        self.elements = left.elements;
        self.children = left.children;
    }
}
