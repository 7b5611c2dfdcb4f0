//! Per-style work-distribution strategies.
//!
//! The four SSV styles share everything in [`SsvShared`] and differ only in
//! how work is queued and how a worker picks its next unit of work — the
//! "strategy polymorphism" collapses to this one small trait, with each
//! concrete style holding just the fields its queue discipline needs.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use ssv_core::atomic::write_barrier;
use ssv_core::{AheadQueue, FifoQueue, LifoQueue, SsvError, SsvResult, WorkerId};

use crate::latency::WorkerWindow;
use crate::shared::SsvShared;
use crate::task::{Task, WorkLoop};
use crate::time::now_ns;
use crate::worker::spawn_worker;
use ssv_core::heap::ReorderHeap;

/// Drive a producer until it exhausts, gets cancelled, hits its yield cap,
/// or the output buffer fills. Returns `Some(task)` when the producer is
/// still alive but was interrupted — the caller decides where that
/// continuation goes (same sequence slot, for Ahead); returns `None` once
/// the task has nothing left to hand back, which for Ahead is the signal
/// that its sequence slot can be released.
fn drive_producer<T>(shared: &Arc<SsvShared<T>>, worker_id: WorkerId, mut task: Task<T>) -> Option<Task<T>>
where
    T: Send + 'static,
{
    let info = shared.worker_info(worker_id);

    loop {
        if shared.is_cancelled() {
            return None;
        }
        if !shared.try_consume_yield_limit() {
            return None;
        }

        let start = now_ns();
        let value = match task.next() {
            Some(v) => v,
            None => return None,
        };
        let elapsed = now_ns().saturating_sub(start);

        let mut cap_reached = false;
        if let Some(info) = &info {
            info.window.record(elapsed);
            let count = info.record_yield();
            if let Some(latency) = &shared.latency {
                let period = WorkerWindow::period(latency.measured_ns(), shared.config.buffer_high);
                if count % period == 0 {
                    let (n, dt) = info.window.take();
                    latency.collect(n, dt, shared.config.buffer_high);
                }
            }
            cap_reached = info.yield_cap_reached();
        }

        shared.push_output(ssv_core::ChildEvent::Yield(value));

        if cap_reached {
            return None;
        }
        let buffer_high = shared.config.buffer_high;
        if buffer_high != 0 && shared.output.len() >= buffer_high {
            return Some(task);
        }
    }
}

/// Run a task to completion on the calling thread, bypassing queue and
/// worker machinery entirely. Used for synchronous mode (`threads_high ==
/// 0`, §8 scenario 6): every task runs on the enqueuing thread, preserving
/// program order since nothing else ever runs concurrently with it.
pub fn drive_synchronously<T: Send + 'static>(shared: &Arc<SsvShared<T>>, mut task: Task<T>) {
    loop {
        if shared.is_cancelled() {
            return;
        }
        if !shared.try_consume_yield_limit() {
            return;
        }
        match task.next() {
            Some(v) => shared.push_output(ssv_core::ChildEvent::Yield(v)),
            None => return,
        }
    }
}

/// Per-style work-distribution strategy.
pub trait Style<T>: Send + Sync {
    /// Enqueue a task for later pickup. Not used by the Parallel style,
    /// which forks eagerly instead (see [`ParallelUnboundedStyle::spawn`]).
    fn enqueue(&self, shared: &Arc<SsvShared<T>>, task: Task<T>) -> SsvResult<()>;

    /// True iff the work queue (and, for Ahead, the reorder heap) is empty
    /// and no worker is registered (§7.5 "done" condition).
    fn is_work_done(&self, shared: &Arc<SsvShared<T>>) -> bool;

    /// Fork one worker for whatever work this style currently has queued.
    /// Returns `None` if there was nothing to dispatch.
    fn fork_worker(&self, shared: &Arc<SsvShared<T>>, yield_max: u64) -> Option<JoinHandle<()>>;

    /// Idempotent once true: the stream is fully drained.
    fn post_process(&self, shared: &Arc<SsvShared<T>>) -> bool {
        self.is_work_done(shared)
    }
}

fn make_work_loop<T, F>(run: F) -> WorkLoop<T>
where
    T: Send + 'static,
    F: FnOnce(Arc<SsvShared<T>>, WorkerId) + Send + 'static,
{
    Box::new(run)
}

/// Depth-first: a linked stack, push prepends, dequeue takes the head.
pub struct AsyncLifoStyle<T> {
    queue: Arc<LifoQueue<Task<T>>>,
}

impl<T: Send + 'static> AsyncLifoStyle<T> {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(LifoQueue::new()),
        }
    }
}

impl<T: Send + 'static> Default for AsyncLifoStyle<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Style<T> for AsyncLifoStyle<T> {
    fn enqueue(&self, shared: &Arc<SsvShared<T>>, task: Task<T>) -> SsvResult<()> {
        self.queue.push(task);
        write_barrier();
        shared.maybe_ring_doorbell();
        Ok(())
    }

    fn is_work_done(&self, shared: &Arc<SsvShared<T>>) -> bool {
        self.queue.is_empty() && shared.workers.is_empty()
    }

    fn fork_worker(&self, shared: &Arc<SsvShared<T>>, yield_max: u64) -> Option<JoinHandle<()>> {
        let task = self.queue.pop()?;
        let queue = Arc::clone(&self.queue);
        let work = make_work_loop(move |shared, worker_id| {
            if let Some(resumed) = drive_producer(&shared, worker_id, task) {
                queue.push(resumed);
            }
        });
        Some(spawn_worker(Arc::clone(shared), work, yield_max))
    }
}

/// Breadth-first: a lock-free Michael-Scott queue.
pub struct WAsyncFifoStyle<T> {
    queue: Arc<FifoQueue<Task<T>>>,
}

impl<T: Send + 'static> WAsyncFifoStyle<T> {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(FifoQueue::new()),
        }
    }
}

impl<T: Send + 'static> Default for WAsyncFifoStyle<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Style<T> for WAsyncFifoStyle<T> {
    fn enqueue(&self, shared: &Arc<SsvShared<T>>, task: Task<T>) -> SsvResult<()> {
        self.queue.push(task);
        write_barrier();
        shared.maybe_ring_doorbell();
        Ok(())
    }

    fn is_work_done(&self, shared: &Arc<SsvShared<T>>) -> bool {
        self.queue.is_empty() && shared.workers.is_empty()
    }

    fn fork_worker(&self, shared: &Arc<SsvShared<T>>, yield_max: u64) -> Option<JoinHandle<()>> {
        let task = self.queue.pop()?;
        let queue = Arc::clone(&self.queue);
        let work = make_work_loop(move |shared, worker_id| {
            if let Some(resumed) = drive_producer(&shared, worker_id, task) {
                queue.push(resumed);
            }
        });
        Some(spawn_worker(Arc::clone(shared), work, yield_max))
    }
}

/// Ordered-ahead: a single-slot work queue plus a sequence-keyed reorder
/// heap implementing the token protocol (§4.3).
///
/// Each enqueued task is assigned its sequence number exactly once, at
/// `enqueue()` time, and keeps that same slot for its entire lifetime —
/// across however many values it yields and however many times it gets
/// interrupted and resumed. `current-seq` therefore advances once per task
/// handoff (exhausted, cancelled, or capped — anything that isn't "still
/// has a continuation to push back"), not once per yielded value: a task
/// holding a slot can yield any number of values while it holds it.
pub struct AheadOrderedStyle<T> {
    work: Arc<AheadQueue<Task<T>>>,
    heap: Arc<ReorderHeap<Task<T>>>,
    next_seq: Arc<AtomicU64>,
}

impl<T: Send + 'static> AheadOrderedStyle<T> {
    /// `current-seq` starts at 0; the first task (handed to
    /// [`AheadOrderedStyle::seed_first_task`]) owns seq 0 and is the token
    /// holder from the start.
    pub fn new() -> Self {
        Self {
            work: Arc::new(AheadQueue::new()),
            heap: Arc::new(ReorderHeap::new(0)),
            next_seq: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Dispatch the SSV's first task directly as the token holder — no
    /// work-queue or heap involvement, since nothing else has a claim on
    /// seq 0 yet.
    pub fn seed_first_task(
        &self,
        shared: &Arc<SsvShared<T>>,
        task: Task<T>,
        yield_max: u64,
    ) -> JoinHandle<()> {
        let heap = Arc::clone(&self.heap);
        let work = make_work_loop(move |shared, worker_id| match drive_producer(&shared, worker_id, task) {
            Some(resumed) => heap.push(0, resumed),
            None => {
                heap.advance();
            }
        });
        spawn_worker(Arc::clone(shared), work, yield_max)
    }

    fn worker_body(
        heap: Arc<ReorderHeap<Task<T>>>,
        work: Arc<AheadQueue<Task<T>>>,
    ) -> impl FnOnce(Arc<SsvShared<T>>, WorkerId) + Send + 'static {
        move |shared, worker_id| loop {
            if shared.is_cancelled() {
                return;
            }

            if let Some((seq, task)) = heap.try_take_current() {
                match drive_producer(&shared, worker_id, task) {
                    Some(resumed) => heap.push(seq, resumed),
                    None => {
                        heap.advance();
                    }
                }
                return;
            }

            if let Some((task, seq)) = work.try_dequeue() {
                if seq == heap.current_seq() {
                    match drive_producer(&shared, worker_id, task) {
                        Some(resumed) => heap.push(seq, resumed),
                        None => {
                            heap.advance();
                        }
                    }
                } else {
                    heap.push(seq, task);
                }
                return;
            }

            return;
        }
    }
}

impl<T: Send + 'static> Default for AheadOrderedStyle<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Style<T> for AheadOrderedStyle<T> {
    fn enqueue(&self, shared: &Arc<SsvShared<T>>, task: Task<T>) -> SsvResult<()> {
        let seq = self.next_seq.fetch_add(1, Ordering::AcqRel);
        self.work
            .try_enqueue(task, seq)
            .map_err(|_| SsvError::AheadSlotNotEmpty)?;
        write_barrier();
        shared.maybe_ring_doorbell();
        Ok(())
    }

    fn is_work_done(&self, shared: &Arc<SsvShared<T>>) -> bool {
        self.work.is_empty() && self.heap.is_empty() && shared.workers.is_empty()
    }

    fn fork_worker(&self, shared: &Arc<SsvShared<T>>, yield_max: u64) -> Option<JoinHandle<()>> {
        if self.work.is_empty() && self.heap.is_empty() {
            return None;
        }
        let body = Self::worker_body(Arc::clone(&self.heap), Arc::clone(&self.work));
        let work: WorkLoop<T> = Box::new(body);
        Some(spawn_worker(Arc::clone(shared), work, yield_max))
    }
}

/// Eager unbounded dispatch: no work queue, every enqueue forks a worker
/// immediately (`maxBuffer = -1`, §3 invariant 7).
pub struct ParallelUnboundedStyle<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + 'static> ParallelUnboundedStyle<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }

    /// The `push-worker-parallel` path: register and fork immediately.
    pub fn spawn(&self, shared: &Arc<SsvShared<T>>, task: Task<T>, yield_max: u64) -> JoinHandle<()> {
        let work = make_work_loop(move |shared, worker_id| {
            // Unbounded: never abandons on buffer pressure since there is no buffer cap.
            let _ = drive_producer(&shared, worker_id, task);
        });
        spawn_worker(Arc::clone(shared), work, yield_max)
    }
}

impl<T: Send + 'static> Default for ParallelUnboundedStyle<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Style<T> for ParallelUnboundedStyle<T> {
    fn enqueue(&self, shared: &Arc<SsvShared<T>>, task: Task<T>) -> SsvResult<()> {
        self.spawn(shared, task, 0);
        Ok(())
    }

    fn is_work_done(&self, shared: &Arc<SsvShared<T>>) -> bool {
        shared.workers.is_empty()
    }

    fn fork_worker(&self, _shared: &Arc<SsvShared<T>>, _yield_max: u64) -> Option<JoinHandle<()>> {
        None
    }
}
