//! The state shared by a consumer and all its workers: everything an SSV
//! needs that isn't specific to a work-distribution style.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use ssv_core::atomic::{cas_modify, store_load_barrier};
use ssv_core::{CancellationToken, ChildEvent, OutputQueue, SpinLock, WorkerId};

use crate::config::SsvConfig;
use crate::doorbell::{new_doorbell, Doorbell};
use crate::latency::LatencyTracker;
use crate::time::now_ns;
use crate::worker::{WorkerInfo, WorkerSet};

/// State common to every SSV style: output queue, doorbell, worker
/// bookkeeping, configuration, latency tracker, and cancellation.
///
/// A concrete [`crate::style::Style`] holds only the fields its queue
/// discipline needs; it receives `Arc<SsvShared<T>>` to reach the rest.
pub struct SsvShared<T> {
    pub output: OutputQueue<T>,
    pub doorbell: Box<dyn Doorbell>,
    pub need_doorbell: AtomicBool,
    pub workers: WorkerSet,
    worker_count: AtomicUsize,
    pub config: SsvConfig,
    pub latency: Option<LatencyTracker>,
    pub cancellation: CancellationToken,
    yield_limit: Option<AtomicU64>,
    /// Wall-clock ns at which worker-count last reached zero, or `-1` if
    /// workers are currently active. Used to exclude idle periods from
    /// long-term latency.
    stopped_at_ns: AtomicI64,
    worker_infos: SpinLock<HashMap<WorkerId, Arc<WorkerInfo>>>,
}

impl<T> SsvShared<T> {
    pub fn new(config: SsvConfig) -> Self {
        let latency = if config.is_paced() {
            Some(LatencyTracker::new(config.worker_latency_ns))
        } else {
            None
        };
        let yield_limit = config.yield_limit.map(AtomicU64::new);
        Self {
            output: OutputQueue::new(),
            doorbell: new_doorbell(),
            need_doorbell: AtomicBool::new(false),
            workers: WorkerSet::new(),
            worker_count: AtomicUsize::new(0),
            yield_limit,
            config,
            latency,
            cancellation: CancellationToken::new(),
            stopped_at_ns: AtomicI64::new(-1),
            worker_infos: SpinLock::new(HashMap::new()),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count.load(Ordering::Acquire)
    }

    pub fn register_worker_info(&self, id: WorkerId, info: Arc<WorkerInfo>) {
        self.worker_infos.lock().insert(id, info);
        self.worker_count.fetch_add(1, Ordering::AcqRel);
        self.mark_active();
    }

    pub fn worker_info(&self, id: WorkerId) -> Option<Arc<WorkerInfo>> {
        self.worker_infos.lock().get(&id).cloned()
    }

    pub fn worker_count_dec(&self) -> usize {
        self.worker_count.fetch_sub(1, Ordering::AcqRel) - 1
    }

    pub fn mark_idle_start(&self) {
        self.stopped_at_ns.store(now_ns() as i64, Ordering::Release);
    }

    pub fn mark_active(&self) {
        self.stopped_at_ns.store(-1, Ordering::Release);
    }

    pub fn is_idle(&self) -> bool {
        self.stopped_at_ns.load(Ordering::Acquire) >= 0
    }

    /// §4.2 enqueue protocol steps 3-4: store-load barrier, then
    /// clear-before-signal so a late consumer reset can never eat a wakeup.
    pub fn maybe_ring_doorbell(&self) {
        store_load_barrier();
        if self.need_doorbell.swap(false, Ordering::AcqRel) {
            self.doorbell.ring();
        }
    }

    /// Push an event and ring the doorbell iff this was the 0->1
    /// transition (§3 invariant 5).
    pub fn push_output(&self, event: ChildEvent<T>) {
        if self.output.push(event) {
            self.maybe_ring_doorbell();
        }
    }

    /// Consume one unit of the yield limit. Returns `false` once exhausted;
    /// always `true` when unlimited.
    pub fn try_consume_yield_limit(&self) -> bool {
        match &self.yield_limit {
            None => true,
            Some(remaining) => cas_modify(remaining, |old| {
                if old == 0 {
                    (0, false)
                } else {
                    (old - 1, true)
                }
            }),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Kill every registered worker cooperatively: cancel the shared token
    /// (workers check it between yields) and drain the worker set.
    pub fn cancel_all(&self) {
        self.cancellation.cancel();
        self.workers.remove_all();
    }
}
