//! Growable array with checked access.

use crate::error::SlotError;
use std::{
    ops::{Index, IndexMut},
    slice,
};


/// Growable array addressed by index.
///
/// Grows by doubling, starting from 1 when created empty. Lookups beyond the
/// live length fail with `SlotError::OutOfBounds` rather than panicking.
#[derive(Debug, Clone)]
pub struct List<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> List<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        List {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `item` and return its index.
    pub fn append(&mut self, item: T) -> usize {
        if self.items.len() >= self.capacity {
            self.capacity = if self.capacity > 0 { self.capacity * 2 } else { 1 };
            self.items.reserve_exact(self.capacity - self.items.len());
        }
        self.items.push(item);
        self.items.len() - 1
    }

    pub fn get(&self, index: usize) -> Result<&T, SlotError> {
        let len = self.items.len();
        self.items.get(index).ok_or(SlotError::OutOfBounds { index, len })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut T, SlotError> {
        let len = self.items.len();
        self.items.get_mut(index).ok_or(SlotError::OutOfBounds { index, len })
    }

    /// Remove the item at `index` by moving the last item into its place.
    ///
    /// Invalidates the index of the previously-last item.
    pub fn remove(&mut self, index: usize) -> Result<T, SlotError> {
        let len = self.items.len();
        if index >= len {
            return Err(SlotError::OutOfBounds { index, len });
        }
        Ok(self.items.swap_remove(index))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items storable before the next growth.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> slice::Iter<T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> slice::IterMut<T> {
        self.items.iter_mut()
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        List::new()
    }
}

impl<T> Index<usize> for List<T> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        &self.items[i]
    }
}

impl<T> IndexMut<usize> for List<T> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.items[i]
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}


#[test]
fn test_list_growth_doubles() {
    let mut list = List::new();
    assert_eq!(list.capacity(), 0);
    let mut seen = Vec::new();
    for i in 0..9 {
        assert_eq!(list.append(i), i);
        seen.push(list.capacity());
    }
    assert_eq!(seen, [1, 2, 4, 4, 8, 8, 8, 8, 16]);
}

#[test]
fn test_list_get_out_of_bounds() {
    let mut list = List::with_capacity(4);
    list.append("a");
    assert_eq!(list.get(0), Ok(&"a"));
    assert_eq!(
        list.get(1),
        Err(SlotError::OutOfBounds { index: 1, len: 1 }),
    );
}

#[test]
fn test_list_remove_swaps_last() {
    let mut list = List::new();
    for c in ['a', 'b', 'c', 'd'] {
        list.append(c);
    }
    assert_eq!(list.remove(1), Ok('b'));
    assert_eq!(list.iter().copied().collect::<String>(), "adc");
    assert_eq!(list.remove(2), Ok('c'));
    assert_eq!(list.iter().copied().collect::<String>(), "ad");
    assert!(list.remove(2).is_err());
}
