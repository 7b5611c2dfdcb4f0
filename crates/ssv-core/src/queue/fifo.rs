//! Lock-free FIFO queue (Michael-Scott style).
//!
//! Backs the WAsync-FIFO work-queue style: breadth-first dequeue order
//! across concurrently-enqueued tasks.

use std::cell::UnsafeCell;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

struct Node<T> {
    value: UnsafeCell<Option<T>>,
    next: AtomicPtr<Node<T>>,
}

unsafe impl<T: Send> Sync for Node<T> {}

/// A lock-free Michael-Scott FIFO queue.
pub struct FifoQueue<T> {
    head: AtomicPtr<Node<T>>,
    tail: AtomicPtr<Node<T>>,
}

unsafe impl<T: Send> Send for FifoQueue<T> {}
unsafe impl<T: Send> Sync for FifoQueue<T> {}

impl<T> FifoQueue<T> {
    pub fn new() -> Self {
        let dummy = Box::into_raw(Box::new(Node {
            value: UnsafeCell::new(None),
            next: AtomicPtr::new(ptr::null_mut()),
        }));
        Self {
            head: AtomicPtr::new(dummy),
            tail: AtomicPtr::new(dummy),
        }
    }

    pub fn push(&self, value: T) {
        let node = Box::into_raw(Box::new(Node {
            value: UnsafeCell::new(Some(value)),
            next: AtomicPtr::new(ptr::null_mut()),
        }));
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            let next = unsafe { (*tail).next.load(Ordering::Acquire) };
            if next.is_null() {
                let cas = unsafe {
                    (*tail).next.compare_exchange(
                        ptr::null_mut(),
                        node,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                };
                if cas.is_ok() {
                    let _ = self.tail.compare_exchange(
                        tail,
                        node,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    );
                    return;
                }
            } else {
                // Tail lagged behind; help it along and retry.
                let _ =
                    self.tail
                        .compare_exchange(tail, next, Ordering::AcqRel, Ordering::Acquire);
            }
        }
    }

    pub fn pop(&self) -> Option<T> {
        loop {
            let head = self.head.load(Ordering::Acquire);
            let tail = self.tail.load(Ordering::Acquire);
            let next = unsafe { (*head).next.load(Ordering::Acquire) };

            if head == tail {
                if next.is_null() {
                    return None;
                }
                // Tail lagged behind a completed push; help it along.
                let _ = self.tail.compare_exchange(
                    tail,
                    next,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                continue;
            }

            if next.is_null() {
                continue;
            }

            if self
                .head
                .compare_exchange_weak(head, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                // We won the CAS: we are the sole owner of `next`'s value.
                let value = unsafe { (*next).value.get().as_mut().unwrap().take() };
                unsafe {
                    drop(Box::from_raw(head));
                }
                return value;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        let head = self.head.load(Ordering::Acquire);
        let next = unsafe { (*head).next.load(Ordering::Acquire) };
        next.is_null()
    }
}

impl<T> Default for FifoQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for FifoQueue<T> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
        let head = self.head.load(Ordering::Acquire);
        unsafe {
            drop(Box::from_raw(head));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn push_pop_is_fifo() {
        let q = FifoQueue::new();
        q.push(1);
        q.push(2);
        q.push(3);
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn empty_on_creation() {
        let q: FifoQueue<u32> = FifoQueue::new();
        assert!(q.is_empty());
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn concurrent_push_pop_preserves_total_count() {
        let q = Arc::new(FifoQueue::new());
        let mut handles = vec![];
        for t in 0..4 {
            let q = Arc::clone(&q);
            handles.push(thread::spawn(move || {
                for i in 0..2000 {
                    q.push(t * 2000 + i);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let mut count = 0;
        while q.pop().is_some() {
            count += 1;
        }
        assert_eq!(count, 8000);
    }

    #[test]
    fn interleaved_producers_consumer() {
        let q = Arc::new(FifoQueue::new());
        let producer_q = Arc::clone(&q);
        let producer = thread::spawn(move || {
            for i in 0..5000 {
                producer_q.push(i);
            }
        });

        let mut received = 0;
        while received < 5000 {
            if q.pop().is_some() {
                received += 1;
            }
        }
        producer.join().unwrap();
        assert_eq!(received, 5000);
    }
}
