//! Lock-free LIFO stack (Treiber stack).
//!
//! Backs the Async-LIFO work-queue style: push prepends, dequeue takes the
//! head, producing depth-first traversal of nested concurrent compositions.

use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

struct Node<T> {
    value: T,
    next: *mut Node<T>,
}

/// A lock-free LIFO stack.
pub struct LifoQueue<T> {
    head: AtomicPtr<Node<T>>,
}

unsafe impl<T: Send> Send for LifoQueue<T> {}
unsafe impl<T: Send> Sync for LifoQueue<T> {}

impl<T> LifoQueue<T> {
    pub fn new() -> Self {
        Self {
            head: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Prepend a value onto the stack.
    pub fn push(&self, value: T) {
        let node = Box::into_raw(Box::new(Node {
            value,
            next: ptr::null_mut(),
        }));
        let mut head = self.head.load(Ordering::Acquire);
        loop {
            unsafe {
                (*node).next = head;
            }
            match self
                .head
                .compare_exchange_weak(head, node, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return,
                Err(observed) => head = observed,
            }
        }
    }

    /// Take the head of the stack, if any.
    pub fn pop(&self) -> Option<T> {
        let mut head = self.head.load(Ordering::Acquire);
        loop {
            if head.is_null() {
                return None;
            }
            let next = unsafe { (*head).next };
            match self
                .head
                .compare_exchange_weak(head, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    let node = unsafe { Box::from_raw(head) };
                    return Some(node.value);
                }
                Err(observed) => head = observed,
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire).is_null()
    }
}

impl<T> Default for LifoQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for LifoQueue<T> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
    }
}
