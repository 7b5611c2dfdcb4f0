//! Reorder heap (Ahead style).
//!
//! A min-heap keyed by sequence number, plus the `current-seq` counter.
//! Dequeue only ever returns an entry whose seq equals `current-seq`;
//! otherwise it returns nothing, which is how a non-token worker learns it
//! cannot yet claim the token (§4.3).
//!
//! Generic over the entry payload `E` so this crate stays unaware of what an
//! Ahead task actually is (`ssv-runtime`/`ssv` own that type).

use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::spinlock::SpinLock;

struct Item<E> {
    seq: u64,
    entry: E,
}

impl<E> PartialEq for Item<E> {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}
impl<E> Eq for Item<E> {}
impl<E> PartialOrd for Item<E> {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}
impl<E> Ord for Item<E> {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.seq.cmp(&other.seq)
    }
}

/// Reorder heap keyed by sequence number.
pub struct ReorderHeap<E> {
    heap: SpinLock<BinaryHeap<Reverse<Item<E>>>>,
    current_seq: AtomicU64,
}

impl<E> ReorderHeap<E> {
    pub fn new(start_seq: u64) -> Self {
        Self {
            heap: SpinLock::new(BinaryHeap::new()),
            current_seq: AtomicU64::new(start_seq),
        }
    }

    /// Push an entry at the given sequence number. No two entries in the
    /// heap share a sequence number (§3 invariant 4) — callers are
    /// responsible for that, since a worker only ever pushes its own task's
    /// next sequence.
    pub fn push(&self, seq: u64, entry: E) {
        self.heap.lock().push(Reverse(Item { seq, entry }));
    }

    /// Pop the entry if its sequence equals `current-seq`; otherwise leave
    /// the heap untouched and return `None`.
    pub fn try_take_current(&self) -> Option<(u64, E)> {
        let mut guard = self.heap.lock();
        let matches = matches!(
            guard.peek(),
            Some(Reverse(item)) if item.seq == self.current_seq.load(Ordering::Acquire)
        );
        if !matches {
            return None;
        }
        let Reverse(item) = guard.pop().expect("peek matched above");
        Some((item.seq, item.entry))
    }

    /// Advance `current-seq` by one (called once a token holder has no
    /// more continuation to hand back — exhausted, cancelled, or capped).
    /// Returns the new current sequence.
    pub fn advance(&self) -> u64 {
        self.current_seq.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn current_seq(&self) -> u64 {
        self.current_seq.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.lock().is_empty()
    }

    /// Smallest sequence number currently held, if any. Used to assert
    /// `current-seq <= min(heap-seq)` in tests.
    pub fn min_seq(&self) -> Option<u64> {
        self.heap.lock().peek().map(|Reverse(item)| item.seq)
    }
}
