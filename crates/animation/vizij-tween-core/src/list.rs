//! Copy-on-write list for collections that may change while being iterated.
//!
//! `lock()` hands out a shared snapshot of the current items. Any mutation
//! made while the snapshot is alive clones the backing vector first, so the
//! loop keeps walking the items it started with and the changes become
//! visible on the next lock.

use std::rc::Rc;

#[derive(Debug)]
pub struct CowList<T> {
    items: Rc<Vec<T>>,
    locked: bool,
}

impl<T> Default for CowList<T> {
    fn default() -> Self {
        Self {
            items: Rc::new(Vec::new()),
            locked: false,
        }
    }
}

impl<T: Clone> CowList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an iteration pass and return its snapshot.
    pub fn lock(&mut self) -> Rc<Vec<T>> {
        debug_assert!(!self.locked, "list must be unlocked before re-locking");
        self.locked = true;
        Rc::clone(&self.items)
    }

    /// End the iteration pass started by [`CowList::lock`].
    pub fn unlock(&mut self) {
        debug_assert!(self.locked, "unlock without a matching lock");
        self.locked = false;
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Cheap clone of the current items.
    #[inline]
    pub fn snapshot(&self) -> Rc<Vec<T>> {
        Rc::clone(&self.items)
    }

    pub fn push(&mut self, item: T) {
        self.items_mut().push(item);
    }

    /// Remove the first item matching `pred`.
    pub fn remove_first(&mut self, pred: impl Fn(&T) -> bool) -> Option<T> {
        let index = self.items.iter().position(pred)?;
        Some(self.items_mut().remove(index))
    }

    pub fn retain(&mut self, pred: impl FnMut(&T) -> bool) {
        self.items_mut().retain(pred);
    }

    pub fn clear(&mut self) {
        self.items = Rc::new(Vec::new());
    }

    fn items_mut(&mut self) -> &mut Vec<T> {
        if Rc::strong_count(&self.items) > 1 {
            log::trace!("copy-on-write: cloning {} items held by a snapshot", self.items.len());
        }
        Rc::make_mut(&mut self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutation_while_locked_does_not_touch_snapshot() {
        let mut list = CowList::new();
        list.push(1);
        list.push(2);

        let snapshot = list.lock();
        list.push(3);
        assert!(list.remove_first(|v| *v == 1).is_some());
        assert_eq!(snapshot.as_slice(), &[1, 2]);
        list.unlock();
        drop(snapshot);

        assert_eq!(list.as_slice(), &[2, 3]);
    }

    #[test]
    fn clear_while_locked_keeps_snapshot() {
        let mut list = CowList::new();
        list.push("a");
        let snapshot = list.lock();
        list.clear();
        list.unlock();
        assert_eq!(snapshot.len(), 1);
        assert!(list.is_empty());
    }

    #[test]
    #[should_panic(expected = "list must be unlocked before re-locking")]
    #[cfg(debug_assertions)]
    fn double_lock_is_fatal_in_debug() {
        let mut list: CowList<u8> = CowList::new();
        let _a = list.lock();
        let _b = list.lock();
    }
}
