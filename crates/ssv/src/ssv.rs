//! The SSV façade: construction, enqueue, read-output, post-process,
//! cancellation — the surface higher-level stream combinators build on.

use std::sync::Arc;

use ssv_core::{ChildEvent, SsvResult};
use ssv_runtime::{
    AheadOrderedStyle, Dispatcher, ParallelUnboundedStyle, SsvConfig, SsvShared, Style, Task, WorkLoop,
};

/// Configuration threaded through SSV construction: persistent fields
/// (threads-high, buffer-high, stream-rate, worker-latency hint) plus a
/// one-shot yield limit that resets at each composition boundary.
#[derive(Clone)]
pub struct SsvState {
    pub config: SsvConfig,
}

impl SsvState {
    pub fn new(config: SsvConfig) -> Self {
        Self { config }
    }

    /// Set the one-shot yield limit for the next SSV built from this state.
    pub fn with_yield_limit(mut self, limit: u64) -> Self {
        self.config.yield_limit = Some(limit);
        self
    }

    /// Carry the persistent fields into a new composition boundary,
    /// dropping the one-shot yield limit.
    pub fn fresh(&self) -> Self {
        let mut config = self.config.clone();
        config.yield_limit = None;
        Self { config }
    }
}

impl Default for SsvState {
    fn default() -> Self {
        Self::new(SsvConfig::default())
    }
}

/// A Stream Scheduler Variable: the work queue, worker pool, output queue,
/// and (for Ahead) reorder heap backing one producer/consumer conduit.
///
/// Shared by exactly one consumer and its workers. `Ssv` holds only the
/// state every style needs (`SsvShared`) plus a handle to the active
/// strategy; the style owns the queue discipline (§4.2/§4.8).
pub struct Ssv<T> {
    shared: Arc<SsvShared<T>>,
    style: Arc<dyn Style<T>>,
}

impl<T: Send + 'static> Ssv<T> {
    /// Construct an Ahead-ordered SSV with its first task already running
    /// as the token holder — no work-queue or heap involvement for seq 0
    /// (§4.8).
    pub fn new_ahead(state: SsvState, first_task: Task<T>) -> Arc<Self> {
        state.config.validate().expect("invalid ssv configuration");
        let shared = Arc::new(SsvShared::new(state.config));
        let style = Arc::new(AheadOrderedStyle::new());
        if shared.config.is_synchronous() {
            // threads_high == 0: run on the constructing thread instead of
            // dispatching a worker (§8 scenario 6).
            ssv_runtime::drive_synchronously(&shared, first_task);
        } else {
            let yield_max = shared.config.yield_limit.unwrap_or(0);
            let _handle = style.seed_first_task(&shared, first_task, yield_max);
        }
        Arc::new(Self { shared, style })
    }

    /// Construct a Parallel-unbounded SSV with no workers yet dispatched
    /// (§4.8). Tasks are forked eagerly on [`Ssv::enqueue`].
    pub fn new_parallel(state: SsvState) -> Arc<Self> {
        state.config.validate().expect("invalid ssv configuration");
        let shared = Arc::new(SsvShared::new(state.config));
        let style = Arc::new(ParallelUnboundedStyle::new());
        Arc::new(Self { shared, style })
    }

    /// Queue a task for later pickup (no-op dispatch for Parallel, which
    /// forks immediately instead). In synchronous mode (`threads_high ==
    /// 0`) the task instead runs to completion on the calling thread,
    /// preserving call order (§8 scenario 6).
    pub fn enqueue(&self, task: Task<T>) -> SsvResult<()> {
        if self.shared.config.is_synchronous() {
            ssv_runtime::drive_synchronously(&self.shared, task);
            return Ok(());
        }
        self.style.enqueue(&self.shared, task)
    }

    /// Block until at least one event is available or the stream is done,
    /// then return every queued event.
    pub fn read_output(&self) -> Vec<ChildEvent<T>> {
        self.dispatcher().read_output()
    }

    /// `true` iff the work queue, heap (if any), and worker set are all
    /// empty. Idempotent once true.
    pub fn post_process(&self) -> bool {
        self.dispatcher().post_process()
    }

    /// Fork a worker immediately, bypassing whatever queue discipline the
    /// active style uses. Child panics are captured the same way as any
    /// other worker (§4.6 mask/try idiom).
    pub fn push_worker_par(&self, work: WorkLoop<T>) {
        let yield_max = self.shared.config.yield_limit.unwrap_or(0);
        ssv_runtime::spawn_worker(Arc::clone(&self.shared), work, yield_max);
    }

    /// Kill every registered worker cooperatively and stop accepting
    /// further progress.
    pub fn cancel_all(&self) {
        self.shared.cancel_all();
    }

    fn dispatcher(&self) -> Dispatcher<T> {
        Dispatcher::new(Arc::clone(&self.shared), Arc::clone(&self.style))
    }
}
