//! The consumer-driven dispatch loop: bounded mode and paced mode.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use ssv_core::atomic::store_load_barrier;
use ssv_core::ChildEvent;

use crate::latency::LatencyTracker;
use crate::shared::SsvShared;
use crate::style::Style;

/// Drives `read_output`/`post_process` for one SSV. Owns no state of its
/// own beyond the shared cell and the active style — it is safe to build a
/// fresh `Dispatcher` per call as long as both are the same `Arc`s.
pub struct Dispatcher<T> {
    shared: Arc<SsvShared<T>>,
    style: Arc<dyn Style<T>>,
}

impl<T: Send + 'static> Dispatcher<T> {
    pub fn new(shared: Arc<SsvShared<T>>, style: Arc<dyn Style<T>>) -> Self {
        Self { shared, style }
    }

    /// Return queued events, blocking until there's at least one or the
    /// stream is fully done (in which case the result may be empty).
    pub fn read_output(&self) -> Vec<ChildEvent<T>> {
        loop {
            if !self.shared.output.is_empty() {
                return self.shared.output.drain();
            }
            if self.style.is_work_done(&self.shared) {
                return Vec::new();
            }
            self.blocking_read();
            // Re-check regardless of wait outcome: covers both a genuine
            // signal and a spurious wakeup.
            if !self.shared.output.is_empty() {
                return self.shared.output.drain();
            }
            if self.style.is_work_done(&self.shared) {
                return Vec::new();
            }
        }
    }

    /// True iff the stream is fully drained: work queue, heap (if any),
    /// and worker set are all empty. Idempotent.
    pub fn post_process(&self) -> bool {
        self.style.post_process(&self.shared)
    }

    fn blocking_read(&self) {
        if self.shared.config.is_synchronous() {
            // threads_high == 0: nothing to dispatch, everything already
            // ran synchronously on the enqueuing thread.
            return;
        }
        if self.shared.config.is_paced() {
            self.blocking_read_paced();
        } else {
            self.blocking_read_bounded();
        }
    }

    fn effective_max_workers(&self) -> usize {
        let mut cap = self.shared.config.threads_high;
        if let Some(limit) = self.shared.config.yield_limit {
            cap = cap.min(limit.max(1) as usize);
        }
        cap.max(self.shared.config.min_workers)
    }

    fn tuned_wait(&self) -> Duration {
        let cpus = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
        let micros = (100 / cpus.max(1)).clamp(10, 100);
        Duration::from_micros(micros as u64)
    }

    /// Bounded mode (§4.7): fork if work remains and under capacity, then
    /// wait on the doorbell — shorter timeout once the stream is already
    /// done and we're only waiting for trailing `Stop` events.
    fn blocking_read_bounded(&self) {
        std::thread::sleep(self.tuned_wait());

        if !self.style.is_work_done(&self.shared) && self.shared.worker_count() < self.effective_max_workers() {
            self.style.fork_worker(&self.shared, self.shared.config.yield_limit.unwrap_or(0));
        }

        self.shared.need_doorbell.store(true, Ordering::Release);
        store_load_barrier();
        if !self.shared.output.is_empty() {
            self.shared.need_doorbell.store(false, Ordering::Release);
            return;
        }

        let timeout = if self.style.is_work_done(&self.shared) {
            Duration::from_millis(5)
        } else {
            Duration::from_millis(50)
        };
        self.shared.doorbell.wait(Some(timeout));
    }

    /// Paced mode (§4.5/§4.7): until a first latency measurement exists,
    /// keep at least one worker alive and just wait (bootstrap). Once
    /// measured, compute the desired worker count and either dispatch up
    /// to it or sleep out the deficit before trying again.
    fn blocking_read_paced(&self) {
        let latency = match &self.shared.latency {
            Some(l) => l,
            None => return self.blocking_read_bounded(),
        };

        if !latency.has_measurement() {
            if self.shared.worker_count() == 0 && !self.style.is_work_done(&self.shared) {
                self.style.fork_worker(&self.shared, 0);
            }
            self.shared.doorbell.wait(Some(Duration::from_millis(10)));
            return;
        }

        let count = self.shared.worker_count() as u64;
        let duration = latency.long_term_duration_ns();
        let l = latency.measured_ns();
        let e = self.shared.config.target_latency_ns().unwrap_or(l.max(1));
        let max_workers = self.effective_max_workers();

        let net = LatencyTracker::desired_worker_count(count, duration, l, e, max_workers);

        let mut dispatched = false;
        if net <= 0 {
            let deficit_ns = count.saturating_mul(e).saturating_sub(duration);
            if deficit_ns >= LatencyTracker::MIN_DELAY_NS {
                std::thread::sleep(Duration::from_nanos(deficit_ns));
            }
            if !self.style.is_work_done(&self.shared) && self.style.fork_worker(&self.shared, 0).is_some() {
                dispatched = true;
            }
        } else {
            while (self.shared.worker_count() as i64) < net {
                if self.style.is_work_done(&self.shared) || self.style.fork_worker(&self.shared, 0).is_none() {
                    break;
                }
                dispatched = true;
            }
        }

        if !dispatched {
            self.shared.need_doorbell.store(true, Ordering::Release);
            store_load_barrier();
            if self.shared.output.is_empty() {
                self.shared.doorbell.wait(Some(Duration::from_millis(50)));
            } else {
                self.shared.need_doorbell.store(false, Ordering::Release);
            }
        }
    }
}
