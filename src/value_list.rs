//! A growable circular buffer holding the values stored under one key.
//!
//! Every element of a [`TwoFourTree`](crate::TwoFourTree) owns a `ValueList`. Values are appended
//! at the back as duplicates are inserted and removed from the front, so both ends must be
//! amortized O(1).

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::iter::FusedIterator;
use core::ops::{Index, IndexMut};

use crate::error::{Error, Result};

/// Capacity is never reduced below this.
const MIN_CAPACITY: usize = 2;

/// An ordered list of values backed by a ring buffer.
///
/// Capacity doubles when a push finds the buffer full and halves after a pop whenever the list
/// occupies a quarter or less of it, never dropping below two slots. Resizing rewrites the ring
/// so the logical front lands on slot zero; logical indices are unaffected.
///
/// # Examples
///
/// ```
/// use two_four_tree::ValueList;
///
/// let mut list = ValueList::new();
/// list.push_back(2);
/// list.push_back(3);
/// list.push_front(1);
///
/// assert_eq!(list.len(), 3);
/// assert_eq!(list[0], 1);
/// assert_eq!(list.pop_front(), Some(1));
/// assert!(list.try_get(5).is_err());
/// ```
#[derive(Clone)]
pub struct ValueList<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    len: usize,
}

impl<T> ValueList<T> {
    /// Creates an empty list with the minimum capacity of two.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MIN_CAPACITY)
    }

    /// Creates an empty list able to hold `capacity` values before growing.
    ///
    /// Capacities below two are rounded up to two.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: empty_slots(capacity.max(MIN_CAPACITY)),
            head: 0,
            len: 0,
        }
    }

    /// Returns the number of values in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots currently allocated.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Removes every value and returns the capacity to its minimum.
    pub fn clear(&mut self) {
        self.slots = empty_slots(MIN_CAPACITY);
        self.head = 0;
        self.len = 0;
    }

    /// Appends `value` at the back.
    pub fn push_back(&mut self, value: T) {
        self.grow_if_full();
        let slot = self.physical(self.len);
        self.slots[slot] = Some(value);
        self.len += 1;
    }

    /// Prepends `value` at the front.
    pub fn push_front(&mut self, value: T) {
        self.grow_if_full();
        self.head = (self.head + self.capacity() - 1) % self.capacity();
        self.slots[self.head] = Some(value);
        self.len += 1;
    }

    /// Removes and returns the last value, or `None` if the list is empty.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        let slot = self.physical(self.len - 1);
        let value = self.slots[slot].take();
        self.len -= 1;
        self.shrink_if_sparse();
        value
    }

    /// Removes and returns the first value, or `None` if the list is empty.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        let value = self.slots[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        self.shrink_if_sparse();
        value
    }

    /// Returns a reference to the value at `index`, or `None` if it is out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        self.slots[self.physical(index)].as_ref()
    }

    /// Returns a mutable reference to the value at `index`, or `None` if it is out of bounds.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len {
            return None;
        }
        let slot = self.physical(index);
        self.slots[slot].as_mut()
    }

    /// Returns a reference to the value at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `index >= len`.
    pub fn try_get(&self, index: usize) -> Result<&T> {
        self.get(index).ok_or(Error::IndexOutOfRange { index, len: self.len })
    }

    /// Returns the first value, if any.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns the last value, if any.
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|last| self.get(last))
    }

    /// Returns a front-to-back iterator over the values.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            front: 0,
            back: self.len,
        }
    }

    /// Returns the first index holding a value equal to `value`.
    ///
    /// # Complexity
    ///
    /// O(n)
    #[must_use]
    pub fn linear_search(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.iter().position(|candidate| candidate == value)
    }

    /// Returns an index holding a value equal to `value`, assuming the list is sorted.
    ///
    /// The result is unspecified (but memory safe) if the list is not sorted.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn binary_search(&self, value: &T) -> Option<usize>
    where
        T: Ord,
    {
        let (mut low, mut high) = (0, self.len);
        while low < high {
            let mid = low + (high - low) / 2;
            match self[mid].cmp(value) {
                core::cmp::Ordering::Less => low = mid + 1,
                core::cmp::Ordering::Greater => high = mid,
                core::cmp::Ordering::Equal => return Some(mid),
            }
        }
        None
    }

    /// Sorts the values in ascending order, keeping equal values in their current relative order.
    pub fn sort(&mut self)
    where
        T: Ord,
    {
        self.make_contiguous().sort();
    }

    /// Returns the `k`-th smallest value (1-based), partially reordering the list around it.
    ///
    /// After the call every value before the returned one's index compares less than or equal to
    /// it and every value after compares greater than or equal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `k` is zero or greater than `len`.
    ///
    /// # Complexity
    ///
    /// Expected O(n)
    pub fn select_nth(&mut self, k: usize) -> Result<&T>
    where
        T: Ord,
    {
        if k == 0 || k > self.len {
            return Err(Error::IndexOutOfRange { index: k, len: self.len });
        }

        let target = k - 1;
        let (mut left, mut right) = (0, self.len - 1);
        while left < right {
            let pivot = self.partition(left, right);
            match target.cmp(&pivot) {
                core::cmp::Ordering::Equal => break,
                core::cmp::Ordering::Less => right = pivot - 1,
                core::cmp::Ordering::Greater => left = pivot + 1,
            }
        }
        self.try_get(target)
    }

    /// Lomuto partition of `left..=right` around a median-of-three pivot; returns the pivot's
    /// final index.
    fn partition(&mut self, left: usize, right: usize) -> usize
    where
        T: Ord,
    {
        let mid = left + (right - left) / 2;
        if self[mid] < self[left] {
            self.swap(mid, left);
        }
        if self[right] < self[left] {
            self.swap(right, left);
        }
        if self[mid] < self[right] {
            self.swap(mid, right);
        }

        let mut store = left;
        for i in left..right {
            if self[i] < self[right] {
                self.swap(store, i);
                store += 1;
            }
        }
        self.swap(store, right);
        store
    }

    fn swap(&mut self, a: usize, b: usize) {
        let (a, b) = (self.physical(a), self.physical(b));
        self.slots.swap(a, b);
    }

    /// Rotates the ring so the values occupy `slots[..len]` and returns them as a slice.
    fn make_contiguous(&mut self) -> &mut [Option<T>] {
        if self.head != 0 {
            self.slots.rotate_left(self.head);
            self.head = 0;
        }
        &mut self.slots[..self.len]
    }

    #[inline]
    fn physical(&self, index: usize) -> usize {
        (self.head + index) % self.capacity()
    }

    fn grow_if_full(&mut self) {
        if self.len == self.capacity() {
            self.resize(self.capacity() * 2);
        }
    }

    fn shrink_if_sparse(&mut self) {
        if self.capacity() > MIN_CAPACITY && self.len * 4 <= self.capacity() {
            self.resize((self.capacity() / 2).max(MIN_CAPACITY));
        }
    }

    fn resize(&mut self, capacity: usize) {
        debug_assert!(capacity >= self.len, "`ValueList::resize()` - `capacity` < `len`!");
        let mut slots: Vec<Option<T>> = Vec::with_capacity(capacity);
        for index in 0..self.len {
            let slot = self.physical(index);
            slots.push(self.slots[slot].take());
        }
        slots.resize_with(capacity, || None);
        self.slots = slots.into_boxed_slice();
        self.head = 0;
    }
}

fn empty_slots<T>(capacity: usize) -> Box<[Option<T>]> {
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, || None);
    slots.into_boxed_slice()
}

impl<T> Default for ValueList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for ValueList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for ValueList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for ValueList<T> {}

/// Reads the value at `index`.
///
/// # Panics
///
/// Panics if `index` is out of bounds.
impl<T> Index<usize> for ValueList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!("`ValueList` index {index} out of range for length {}", self.len),
        }
    }
}

/// Writes the value at `index`.
///
/// # Panics
///
/// Panics if `index` is out of bounds.
impl<T> IndexMut<usize> for ValueList<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("`ValueList` index {index} out of range for length {len}"),
        }
    }
}

impl<T> FromIterator<T> for ValueList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = ValueList::new();
        list.extend(iter);
        list
    }
}

impl<T> Extend<T> for ValueList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<'a, T> IntoIterator for &'a ValueList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A front-to-back iterator over a [`ValueList`].
///
/// This `struct` is created by [`ValueList::iter`].
#[derive(Clone)]
pub struct Iter<'a, T> {
    list: &'a ValueList<T>,
    front: usize,
    back: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let value = self.list.get(self.front);
        self.front += 1;
        value
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        self.list.get(self.back)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}
