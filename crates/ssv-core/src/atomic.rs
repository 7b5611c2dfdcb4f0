//! CAS-loop modify primitive and memory barriers.
//!
//! A typed `cas_modify` helper used anywhere an atomic cell needs a
//! bounded-retry read-modify-write: the yield-limit counter, the reorder
//! heap's current-sequence advance, and worker-count bookkeeping.

use core::sync::atomic::{fence, AtomicU64, Ordering};

/// Number of ticket-based CAS attempts before the coarse fallback engages.
const MAX_CAS_RETRIES: u32 = 25;

/// Read-modify-write an atomic `u64` cell via a bounded CAS-retry loop.
///
/// `f` receives the current value and returns `(new_value, result)`. The
/// first [`MAX_CAS_RETRIES`] failed compare-exchange attempts spin on a
/// ticket read of the old value (fast path under low contention); after that
/// it falls back to an unbounded `compare_exchange` loop that is guaranteed
/// to make progress, trading throughput for a worst-case bound on the common
/// case.
pub fn cas_modify<R>(cell: &AtomicU64, mut f: impl FnMut(u64) -> (u64, R)) -> R {
    let mut old = cell.load(Ordering::Acquire);
    for _ in 0..MAX_CAS_RETRIES {
        let (new, result) = f(old);
        match cell.compare_exchange_weak(old, new, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => return result,
            Err(observed) => old = observed,
        }
    }
    loop {
        let (new, result) = f(old);
        match cell.compare_exchange(old, new, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => return result,
            Err(observed) => old = observed,
        }
    }
}

/// Barrier issued after an enqueue and before any doorbell-visibility check:
/// ensures the enqueued item is observable before a wakeup decision is made.
#[inline]
pub fn write_barrier() {
    fence(Ordering::Release);
}

/// Barrier between "I just enqueued" and "does the consumer need a doorbell
/// ring?". Without it, the producer's enqueue and the consumer's
/// `need-doorbell` store could be reordered with respect to each other,
/// producing the classic lost-wakeup.
#[inline]
pub fn store_load_barrier() {
    fence(Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cas_modify_increments() {
        let cell = AtomicU64::new(0);
        for i in 1..=100 {
            let result = cas_modify(&cell, |old| (old + 1, old + 1));
            assert_eq!(result, i);
        }
        assert_eq!(cell.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn cas_modify_decrement_floor() {
        let cell = AtomicU64::new(3);
        let dec = |old: u64| -> (u64, bool) {
            if old == 0 {
                (0, false)
            } else {
                (old - 1, true)
            }
        };
        assert!(cas_modify(&cell, dec));
        assert!(cas_modify(&cell, dec));
        assert!(cas_modify(&cell, dec));
        assert!(!cas_modify(&cell, dec));
        assert_eq!(cell.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cas_modify_under_contention() {
        use std::sync::atomic::AtomicU64 as A;
        use std::sync::Arc;
        use std::thread;

        let cell = Arc::new(A::new(0u64));
        let mut handles = vec![];
        for _ in 0..8 {
            let cell = Arc::clone(&cell);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    cas_modify(&cell, |old| (old + 1, ()));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cell.load(Ordering::SeqCst), 8000);
    }
}
