//! Identity-tracked sequence
//!
//! A `TrackerList` behaves like a `Vec`, except that membership and counting
//! compare by identity rather than by value, and cost a hash lookup instead
//! of a scan. Game objects and drives have no meaningful value equality, so
//! "is this exact instance here" is the only question worth asking.

use std::collections::HashMap;
use std::ops::{Bound, RangeBounds};
use std::rc::Rc;

use crate::error::{Result, SimError};

/// Opaque identity of a tracked item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(pub u64);

/// Items that carry a stable identity
pub trait Tracked {
    fn identity(&self) -> Identity;
}

/// Shared handles are identified by their allocation, not their contents
impl<T: ?Sized> Tracked for Rc<T> {
    fn identity(&self) -> Identity {
        Identity(Rc::as_ptr(self) as *const () as usize as u64)
    }
}

/// A sequence with an identity-count index kept consistent with its content.
///
/// Mutable access (`get_mut`, `iter_mut`) must not replace an element
/// wholesale with a differently-identified one; use `set` for that.
#[derive(Debug, Clone)]
pub struct TrackerList<T: Tracked> {
    items: Vec<T>,
    counts: HashMap<Identity, usize>,
}

impl<T: Tracked> Default for TrackerList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Tracked> TrackerList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            counts: HashMap::new(),
        }
    }

    fn incr(&mut self, id: Identity, n: usize) {
        *self.counts.entry(id).or_insert(0) += n;
    }

    fn decr(&mut self, id: Identity) {
        if let Some(count) = self.counts.get_mut(&id) {
            if *count > 1 {
                *count -= 1;
            } else {
                self.counts.remove(&id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, item: T) {
        self.incr(item.identity(), 1);
        self.items.push(item);
    }

    /// Panics if `index > len`, like `Vec::insert`
    pub fn insert(&mut self, index: usize, item: T) {
        self.incr(item.identity(), 1);
        self.items.insert(index, item);
    }

    pub fn pop(&mut self) -> Option<T> {
        let item = self.items.pop()?;
        self.decr(item.identity());
        Some(item)
    }

    /// Remove and return the item at `index`, if there is one
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index >= self.items.len() {
            return None;
        }
        let item = self.items.remove(index);
        self.decr(item.identity());
        Some(item)
    }

    /// Remove the first element with the same identity as `item`
    pub fn remove(&mut self, item: &T) -> Result<T> {
        let id = item.identity();
        let index = self.position(id).ok_or(SimError::NotPresent)?;
        // Index only changes once the element is known to be gone
        let removed = self.items.remove(index);
        self.decr(id);
        Ok(removed)
    }

    /// Replace the item at `index`, returning the old one
    pub fn set(&mut self, index: usize, item: T) -> Option<T> {
        let slot = self.items.get_mut(index)?;
        let new_id = item.identity();
        let old = std::mem::replace(slot, item);
        self.decr(old.identity());
        self.incr(new_id, 1);
        Some(old)
    }

    pub fn contains(&self, item: &T) -> bool {
        self.counts.contains_key(&item.identity())
    }

    /// Number of elements with the same identity as `item`
    pub fn count(&self, item: &T) -> usize {
        self.count_identity(item.identity())
    }

    pub fn count_identity(&self, id: Identity) -> usize {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    /// Index of the first element with the given identity
    pub fn position(&self, id: Identity) -> Option<usize> {
        if !self.counts.contains_key(&id) {
            return None;
        }
        self.items.iter().position(|x| x.identity() == id)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    pub fn find(&self, id: Identity) -> Option<&T> {
        self.position(id).map(|i| &self.items[i])
    }

    pub fn find_mut(&mut self, id: Identity) -> Option<&mut T> {
        self.position(id).map(move |i| &mut self.items[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Remove a range of elements (slice deletion)
    pub fn drain<R: RangeBounds<usize>>(&mut self, range: R) -> Vec<T> {
        let removed: Vec<T> = self.items.drain(range).collect();
        for item in &removed {
            self.decr(item.identity());
        }
        removed
    }

    /// Replace a range of elements with new ones (slice assignment)
    pub fn splice<R, I>(&mut self, range: R, replace_with: I) -> Vec<T>
    where
        R: RangeBounds<usize>,
        I: IntoIterator<Item = T>,
    {
        let incoming: Vec<T> = replace_with.into_iter().collect();
        for item in &incoming {
            self.incr(item.identity(), 1);
        }
        let removed: Vec<T> = self.items.splice(range, incoming).collect();
        for item in &removed {
            self.decr(item.identity());
        }
        removed
    }

    /// Remove and return every element matching `pred`, keeping order of the rest
    pub fn extract_if<F: FnMut(&T) -> bool>(&mut self, mut pred: F) -> Vec<T> {
        let mut kept = Vec::with_capacity(self.items.len());
        let mut removed = Vec::new();
        for item in self.items.drain(..) {
            if pred(&item) {
                removed.push(item);
            } else {
                kept.push(item);
            }
        }
        self.items = kept;
        for item in &removed {
            self.decr(item.identity());
        }
        removed
    }

    /// Take every element out, leaving the list empty
    pub fn take_all(&mut self) -> Vec<T> {
        self.counts.clear();
        std::mem::take(&mut self.items)
    }
}

impl<T: Tracked + Clone> TrackerList<T> {
    /// A new list holding clones of a range of elements. Out-of-range bounds
    /// are clamped to the list, so an empty or reversed range gives an empty list.
    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> Self {
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => self.items.len(),
        };
        let len = self.items.len();
        let end = end.min(len);
        let start = start.min(end);
        self.items[start..end].iter().cloned().collect()
    }

    /// This list's elements repeated `n` times
    pub fn repeat(&self, n: usize) -> Self {
        let mut out = Self::new();
        for _ in 0..n {
            out.extend(self.items.iter().cloned());
        }
        out
    }
}

impl<T: Tracked> Extend<T> for TrackerList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<T: Tracked> FromIterator<T> for TrackerList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<T: Tracked> IntoIterator for TrackerList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T: Tracked> IntoIterator for &'a TrackerList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Tracked> std::ops::Index<usize> for TrackerList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_not_value() {
        let a = Rc::new(5);
        let b = Rc::new(5);
        assert_eq!(a, b); // equal values

        let mut list = TrackerList::new();
        list.push(a.clone());
        assert!(list.contains(&a));
        assert!(!list.contains(&b));

        list.push(b.clone());
        assert_eq!(list.count(&a), 1);
        assert_eq!(list.count(&b), 1);

        list.remove(&a).unwrap();
        assert!(!list.contains(&a));
        assert!(list.contains(&b));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_same_instance_counted_twice() {
        let a = Rc::new("drive");
        let mut list: TrackerList<_> = [a.clone(), a.clone()].into_iter().collect();
        assert_eq!(list.count(&a), 2);
        list.pop();
        assert_eq!(list.count(&a), 1);
        list.pop();
        assert_eq!(list.count(&a), 0);
        assert!(list.pop().is_none());
    }

    #[test]
    fn test_remove_missing_leaves_index_alone() {
        let a = Rc::new(1);
        let stranger = Rc::new(1);
        let mut list = TrackerList::new();
        list.push(a.clone());

        assert!(matches!(list.remove(&stranger), Err(SimError::NotPresent)));
        assert_eq!(list.count(&a), 1);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_insert_set_and_remove_at() {
        let (a, b, c) = (Rc::new('a'), Rc::new('b'), Rc::new('c'));
        let mut list = TrackerList::new();
        list.push(a.clone());
        list.insert(0, b.clone());
        assert_eq!(*list[0], 'b');

        let old = list.set(0, c.clone()).unwrap();
        assert!(Rc::ptr_eq(&old, &b));
        assert!(!list.contains(&b));
        assert!(list.contains(&c));

        let gone = list.remove_at(1).unwrap();
        assert!(Rc::ptr_eq(&gone, &a));
        assert!(!list.contains(&a));
        assert!(list.remove_at(7).is_none());
    }

    #[test]
    fn test_drain_and_splice_keep_counts() {
        let items: Vec<Rc<u32>> = (0..5).map(Rc::new).collect();
        let mut list: TrackerList<_> = items.iter().cloned().collect();

        let drained = list.drain(1..3);
        assert_eq!(drained.len(), 2);
        assert!(!list.contains(&items[1]));
        assert!(!list.contains(&items[2]));
        assert!(list.contains(&items[3]));

        let fresh = Rc::new(99);
        let replaced = list.splice(0..1, [fresh.clone(), fresh.clone()]);
        assert!(Rc::ptr_eq(&replaced[0], &items[0]));
        assert_eq!(list.count(&fresh), 2);
        assert!(!list.contains(&items[0]));
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_slice_and_repeat() {
        let a = Rc::new(1);
        let b = Rc::new(2);
        let list: TrackerList<_> = [a.clone(), b.clone()].into_iter().collect();

        let tail = list.slice(1..);
        assert_eq!(tail.len(), 1);
        assert!(tail.contains(&b));
        assert!(!tail.contains(&a));

        assert_eq!(list.slice(1..10).len(), 1);
        assert!(list.slice(5..).is_empty());
        assert!(list.slice(..=7).contains(&a));
        assert_eq!(list.slice(..=7).len(), 2);

        let tripled = list.repeat(3);
        assert_eq!(tripled.len(), 6);
        assert_eq!(tripled.count(&a), 3);
    }

    #[test]
    fn test_extract_if() {
        let items: Vec<Rc<u32>> = (0..6).map(Rc::new).collect();
        let mut list: TrackerList<_> = items.iter().cloned().collect();
        let evens = list.extract_if(|x| **x % 2 == 0);
        assert_eq!(evens.len(), 3);
        assert_eq!(list.len(), 3);
        assert!(!list.contains(&items[0]));
        assert!(list.contains(&items[1]));
        assert_eq!(*list[2], 5);
    }
}
