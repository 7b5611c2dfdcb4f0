//! Ahead-Ordered single-slot work queue.
//!
//! Only a right-associated remainder is ever queued in Ahead mode (the
//! front task always runs directly on the producing thread), so a single
//! sequenced slot suffices: enqueue asserts the slot is empty then stores
//! `(task, seq)`; dequeue returns `(task, seq)` or nothing.

use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

struct Entry<T> {
    task: T,
    seq: u64,
}

/// A single-slot `(task, seq)` buffer.
pub struct AheadQueue<T> {
    slot: AtomicPtr<Entry<T>>,
}

unsafe impl<T: Send> Send for AheadQueue<T> {}
unsafe impl<T: Send> Sync for AheadQueue<T> {}

impl<T> AheadQueue<T> {
    pub fn new() -> Self {
        Self {
            slot: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Store `(task, seq)` in the slot. Fails with the task handed back if
    /// the slot was already occupied — the precondition is that at most one
    /// task is ever pending (§3 invariant 3).
    pub fn try_enqueue(&self, task: T, seq: u64) -> Result<(), T> {
        let boxed = Box::into_raw(Box::new(Entry { task, seq }));
        match self
            .slot
            .compare_exchange(ptr::null_mut(), boxed, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(()),
            Err(_) => {
                let entry = unsafe { Box::from_raw(boxed) };
                Err(entry.task)
            }
        }
    }

    /// Take `(task, seq)` out of the slot, if present.
    pub fn try_dequeue(&self) -> Option<(T, u64)> {
        loop {
            let cur = self.slot.load(Ordering::Acquire);
            if cur.is_null() {
                return None;
            }
            match self
                .slot
                .compare_exchange_weak(cur, ptr::null_mut(), Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    let entry = unsafe { Box::from_raw(cur) };
                    return Some((entry.task, entry.seq));
                }
                Err(_) => continue,
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slot.load(Ordering::Acquire).is_null()
    }
}

impl<T> Default for AheadQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for AheadQueue<T> {
    fn drop(&mut self) {
        let _ = self.try_dequeue();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_dequeue_roundtrip() {
        let q = AheadQueue::new();
        assert!(q.is_empty());
        q.try_enqueue("task", 7).unwrap();
        assert!(!q.is_empty());
        assert_eq!(q.try_dequeue(), Some(("task", 7)));
        assert!(q.is_empty());
    }

    #[test]
    fn enqueue_into_occupied_slot_fails() {
        let q = AheadQueue::new();
        q.try_enqueue("first", 0).unwrap();
        let err = q.try_enqueue("second", 1).unwrap_err();
        assert_eq!(err, "second");
        // Original occupant is untouched.
        assert_eq!(q.try_dequeue(), Some(("first", 0)));
    }

    #[test]
    fn dequeue_empty_returns_none() {
        let q: AheadQueue<u32> = AheadQueue::new();
        assert_eq!(q.try_dequeue(), None);
    }
}
