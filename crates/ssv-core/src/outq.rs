//! Output queue: a `(list, len)` cell drained by the single consumer.
//!
//! Push and drain both go through one spinlock-guarded critical section, so
//! a push can never land between drain's list-swap and its length-reset
//! (the pair used to be two independent atomics, which let a racing push's
//! length contribution get silently clobbered by drain's reset). This
//! module only owns the data structure — the "was this the 0->1 transition"
//! decision it returns is the producer-side half of the doorbell handshake;
//! ringing the actual doorbell is the caller's job (`ssv-runtime`/`ssv`,
//! which also own the `need-doorbell` flag shared with the work-queue
//! enqueue path).

use std::ptr;

use crate::error::SsvError;
use crate::ids::WorkerId;
use crate::spinlock::SpinLock;

/// An event posted by a worker to the output queue.
#[derive(Debug)]
pub enum ChildEvent<T> {
    /// A value yielded by a worker's task.
    Yield(T),
    /// A worker has finished: `None` on normal completion, `Some(err)` if it
    /// was captured via the mask/try idiom.
    Stop(WorkerId, Option<SsvError>),
}

struct OutNode<T> {
    event: ChildEvent<T>,
    next: *mut OutNode<T>,
}

struct Inner<T> {
    head: *mut OutNode<T>,
    len: usize,
}

// Safety: the spinlock around `Inner` gives exclusive access to the raw
// pointer; nothing else ever touches it.
unsafe impl<T: Send> Send for Inner<T> {}

/// Spinlock-guarded output queue.
pub struct OutputQueue<T> {
    inner: SpinLock<Inner<T>>,
}

unsafe impl<T: Send> Send for OutputQueue<T> {}
unsafe impl<T: Send> Sync for OutputQueue<T> {}

impl<T> OutputQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: SpinLock::new(Inner {
                head: ptr::null_mut(),
                len: 0,
            }),
        }
    }

    /// Push an event. Returns `true` if this push transitioned the queue
    /// length from 0 to 1 (§3 invariant 5: the doorbell must ring on this
    /// transition).
    pub fn push(&self, event: ChildEvent<T>) -> bool {
        let node = Box::into_raw(Box::new(OutNode {
            event,
            next: ptr::null_mut(),
        }));
        let mut guard = self.inner.lock();
        unsafe {
            (*node).next = guard.head;
        }
        guard.head = node;
        guard.len += 1;
        guard.len == 1
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Atomically drain all queued events, returned in push (chronological)
    /// order.
    pub fn drain(&self) -> Vec<ChildEvent<T>> {
        let (head, drained) = {
            let mut guard = self.inner.lock();
            let head = guard.head;
            let drained = guard.len;
            guard.head = ptr::null_mut();
            guard.len = 0;
            (head, drained)
        };

        let mut events = Vec::with_capacity(drained);
        let mut cur = head;
        while !cur.is_null() {
            let node = unsafe { Box::from_raw(cur) };
            cur = node.next;
            events.push(node.event);
        }
        events.reverse();
        events
    }
}

impl<T> Default for OutputQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for OutputQueue<T> {
    fn drop(&mut self) {
        let _ = self.drain();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_reports_empty_to_nonempty_transition() {
        let q: OutputQueue<i32> = OutputQueue::new();
        assert!(q.push(ChildEvent::Yield(1)));
        assert!(!q.push(ChildEvent::Yield(2)));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn drain_preserves_push_order() {
        let q: OutputQueue<i32> = OutputQueue::new();
        q.push(ChildEvent::Yield(1));
        q.push(ChildEvent::Yield(2));
        q.push(ChildEvent::Yield(3));

        let drained = q.drain();
        let values: Vec<i32> = drained
            .into_iter()
            .map(|e| match e {
                ChildEvent::Yield(v) => v,
                _ => panic!("unexpected stop event"),
            })
            .collect();
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(q.len(), 0);
        assert!(q.is_empty());
    }

    #[test]
    fn drain_on_empty_queue_is_empty() {
        let q: OutputQueue<i32> = OutputQueue::new();
        assert!(q.drain().is_empty());
    }

    #[test]
    fn concurrent_pushes_preserve_total_count() {
        use std::sync::Arc;
        use std::thread;

        let q = Arc::new(OutputQueue::new());
        let mut handles = vec![];
        for t in 0..4 {
            let q = Arc::clone(&q);
            handles.push(thread::spawn(move || {
                for i in 0..1000 {
                    q.push(ChildEvent::Yield(t * 1000 + i));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(q.drain().len(), 4000);
    }
}
