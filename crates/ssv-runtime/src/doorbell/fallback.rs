//! Fallback doorbell using `std::sync::Condvar`.
//!
//! Used on platforms without futex support. Less efficient but portable.

use super::Doorbell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Condvar-based doorbell (fallback).
pub struct CondvarDoorbell {
    mutex: Mutex<bool>, // bool = ring pending
    condvar: Condvar,
    parked: AtomicUsize,
}

impl CondvarDoorbell {
    pub fn new() -> Self {
        Self {
            mutex: Mutex::new(false),
            condvar: Condvar::new(),
            parked: AtomicUsize::new(0),
        }
    }
}

impl Default for CondvarDoorbell {
    fn default() -> Self {
        Self::new()
    }
}

impl Doorbell for CondvarDoorbell {
    fn wait(&self, timeout: Option<Duration>) -> bool {
        self.parked.fetch_add(1, Ordering::SeqCst);

        let mut guard = self.mutex.lock().unwrap();

        if *guard {
            *guard = false;
            self.parked.fetch_sub(1, Ordering::SeqCst);
            return true;
        }

        let result = match timeout {
            Some(t) => {
                let (g, timeout_result) = self.condvar.wait_timeout(guard, t).unwrap();
                guard = g;
                !timeout_result.timed_out()
            }
            None => {
                guard = self.condvar.wait(guard).unwrap();
                true
            }
        };

        if *guard {
            *guard = false;
        }

        self.parked.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn ring(&self) {
        {
            let mut guard = self.mutex.lock().unwrap();
            *guard = true;
        }
        self.condvar.notify_one();
    }

    fn parked_count(&self) -> usize {
        self.parked.load(Ordering::Relaxed)
    }
}
