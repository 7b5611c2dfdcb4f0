//! Worker lifecycle: spawn, mask/try panic capture, toggle-register, exit.

use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use ssv_core::{slog_debug, slog_error, ChildEvent, SpinLock, SsvError, WorkerId};

use crate::latency::WorkerWindow;
use crate::shared::SsvShared;
use crate::task::WorkLoop;

/// Per-worker bookkeeping: yield cap, running yield count, and the
/// latency window it periodically folds into the shared tracker.
pub struct WorkerInfo {
    pub id: WorkerId,
    yield_max: u64,
    yields_so_far: AtomicU64,
    pub window: WorkerWindow,
}

impl WorkerInfo {
    pub fn new(id: WorkerId, yield_max: u64) -> Self {
        Self {
            id,
            yield_max,
            yields_so_far: AtomicU64::new(0),
            window: WorkerWindow::new(),
        }
    }

    /// Record one yield, returning the worker's new running total.
    pub fn record_yield(&self) -> u64 {
        self.yields_so_far.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// (a) the worker's own yield count reached its cap.
    pub fn yield_cap_reached(&self) -> bool {
        self.yield_max != 0 && self.yields_so_far.load(Ordering::Acquire) >= self.yield_max
    }
}

/// The set of currently-registered worker ids, plus the toggle-register
/// race handling described in the worker lifecycle design.
pub struct WorkerSet {
    inner: SpinLock<HashSet<WorkerId>>,
}

impl WorkerSet {
    pub fn new() -> Self {
        Self {
            inner: SpinLock::new(HashSet::new()),
        }
    }

    /// Atomically: if `id` is present, remove it (returns `true`, the set
    /// shrank); otherwise insert it (returns `false`).
    pub fn toggle_register(&self, id: WorkerId) -> bool {
        let mut set = self.inner.lock();
        if set.remove(&id) {
            true
        } else {
            set.insert(id);
            false
        }
    }

    pub fn count(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn snapshot(&self) -> Vec<WorkerId> {
        self.inner.lock().iter().copied().collect()
    }

    /// Drain the whole set, returning every member (used by cancellation).
    pub fn remove_all(&self) -> Vec<WorkerId> {
        let mut set = self.inner.lock();
        set.drain().collect()
    }
}

impl Default for WorkerSet {
    fn default() -> Self {
        Self::new()
    }
}

/// A panic payload captured via the mask/try idiom, converted to a
/// plain displayable error.
#[derive(Debug)]
pub struct WorkerPanic(pub String);

impl fmt::Display for WorkerPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker panicked: {}", self.0)
    }
}

impl std::error::Error for WorkerPanic {}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Run `body` under the mask/try idiom: exceptions (panics) are caught and
/// converted rather than unwinding past the worker thread boundary.
pub fn run_masked<F: FnOnce()>(body: F) -> Option<WorkerPanic> {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(()) => None,
        Err(payload) => Some(WorkerPanic(panic_message(&*payload))),
    }
}

/// Fork a worker thread running `work`, with the full registration/exit
/// protocol from the worker lifecycle design:
///
/// 1. Toggle-register into the worker set (guards against a worker that
///    finishes before the parent's own registration would run).
/// 2. Run the work loop under mask/try.
/// 3. Toggle-register out; if that shrank the set, decrement worker-count
///    and, if it reached zero, mark the idle-start timestamp.
/// 4. Post `Stop(self, err)` to the output queue and ring the doorbell
///    unconditionally (the consumer must learn of stops even when the
///    push wasn't the 0->1 transition).
pub fn spawn_worker<T: Send + 'static>(
    shared: Arc<SsvShared<T>>,
    work: WorkLoop<T>,
    yield_max: u64,
) -> JoinHandle<()> {
    let id = WorkerId::next();
    let info = Arc::new(WorkerInfo::new(id, yield_max));
    shared.register_worker_info(id, Arc::clone(&info));

    thread::Builder::new()
        .name(format!("{id}"))
        .spawn(move || {
            ssv_core::log::set_worker_id(id.0);

            if shared.workers.toggle_register(id) {
                shared.doorbell.ring();
            }

            let run_shared = Arc::clone(&shared);
            let panic = run_masked(move || {
                work(run_shared, id);
            });

            if let Some(ref p) = panic {
                slog_error!("{}", p);
            }

            if shared.workers.toggle_register(id) {
                let remaining = shared.worker_count_dec();
                if remaining == 0 {
                    shared.mark_idle_start();
                }
            }

            let err = panic.map(|p| SsvError::WorkerPanicked {
                worker: id,
                source: Box::new(p),
            });
            slog_debug!("worker {} stopping, err={:?}", id, err.is_some());
            shared.push_output(ChildEvent::Stop(id, err));
            shared.doorbell.ring();

            ssv_core::log::clear_worker_id();
        })
        .expect("failed to spawn ssv worker thread")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_register_insert_then_remove() {
        let set = WorkerSet::new();
        let id = WorkerId::next();
        assert!(!set.toggle_register(id)); // inserted
        assert_eq!(set.count(), 1);
        assert!(set.toggle_register(id)); // removed, shrank
        assert!(set.is_empty());
    }

    #[test]
    fn worker_info_yield_cap() {
        let info = WorkerInfo::new(WorkerId::next(), 3);
        assert!(!info.yield_cap_reached());
        info.record_yield();
        info.record_yield();
        info.record_yield();
        assert!(info.yield_cap_reached());
    }

    #[test]
    fn worker_info_unlimited_never_caps() {
        let info = WorkerInfo::new(WorkerId::next(), 0);
        for _ in 0..1000 {
            info.record_yield();
        }
        assert!(!info.yield_cap_reached());
    }

    #[test]
    fn run_masked_captures_panic() {
        let result = run_masked(|| panic!("boom"));
        assert!(result.is_some());
        assert!(result.unwrap().0.contains("boom"));
    }

    #[test]
    fn run_masked_passes_through_normal_completion() {
        let result = run_masked(|| {});
        assert!(result.is_none());
    }

    #[test]
    fn remove_all_drains_set() {
        let set = WorkerSet::new();
        let a = WorkerId::next();
        let b = WorkerId::next();
        set.toggle_register(a);
        set.toggle_register(b);
        let drained = set.remove_all();
        assert_eq!(drained.len(), 2);
        assert!(set.is_empty());
    }
}
