//! Latency accounting and the pacing model that derives desired worker count.
//!
//! Four counters per SSV (spec'd as one per-worker "current" block that
//! periodically folds into a consumer-owned "collected" block, plus the
//! smoothed "measured" estimate and a long-term total). All bookkeeping
//! happens in nanoseconds; the gain term in [`LatencyTracker::desired_worker_count`]
//! is the one spot that works in microseconds — see the module-level note
//! on that function.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::time::now_ns;

const MIN_DELAY_NS: u64 = 1_000_000; // 1ms

/// A worker-local latency window: yields observed and cumulative work-time
/// since the last fold into the shared `collected` counter.
#[derive(Debug, Default)]
pub struct WorkerWindow {
    pub count: AtomicU64,
    pub elapsed_ns: AtomicU64,
}

impl WorkerWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, elapsed_ns: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.elapsed_ns.fetch_add(elapsed_ns, Ordering::Relaxed);
    }

    /// Number of yields between a worker's latency self-reports, derived
    /// from the current smoothed latency estimate.
    pub fn period(measured_ns: u64, buffer_high: usize) -> u64 {
        if measured_ns == 0 {
            return 1;
        }
        (MIN_DELAY_NS / measured_ns).clamp(1, buffer_high.max(1) as u64)
    }

    pub fn take(&self) -> (u64, u64) {
        (
            self.count.swap(0, Ordering::AcqRel),
            self.elapsed_ns.swap(0, Ordering::AcqRel),
        )
    }
}

/// Shared latency state for a paced SSV.
pub struct LatencyTracker {
    collected_n: AtomicU64,
    collected_dt_ns: AtomicU64,
    measured_ns: AtomicU64,
    long_term_n: AtomicU64,
    long_term_start_ns: AtomicU64,
}

impl LatencyTracker {
    pub fn new(bootstrap_ns: Option<u64>) -> Self {
        Self {
            collected_n: AtomicU64::new(0),
            collected_dt_ns: AtomicU64::new(0),
            measured_ns: AtomicU64::new(bootstrap_ns.unwrap_or(0)),
            long_term_n: AtomicU64::new(0),
            long_term_start_ns: AtomicU64::new(now_ns()),
        }
    }

    pub fn measured_ns(&self) -> u64 {
        self.measured_ns.load(Ordering::Acquire)
    }

    pub fn has_measurement(&self) -> bool {
        self.measured_ns() > 0
    }

    pub fn long_term_yields(&self) -> u64 {
        self.long_term_n.load(Ordering::Acquire)
    }

    pub fn long_term_duration_ns(&self) -> u64 {
        now_ns().saturating_sub(self.long_term_start_ns.load(Ordering::Acquire))
    }

    /// Fold a worker's window into the collected counter; if the pending
    /// mass is large enough (or latency has swung >2x, or there is no prior
    /// measurement) re-derive `measured` and reset `collected`.
    pub fn collect(&self, window_n: u64, window_dt_ns: u64, buffer_high: usize) {
        if window_n == 0 {
            return;
        }
        self.long_term_n.fetch_add(window_n, Ordering::Relaxed);

        let pending_n = self.collected_n.fetch_add(window_n, Ordering::AcqRel) + window_n;
        let pending_dt = self.collected_dt_ns.fetch_add(window_dt_ns, Ordering::AcqRel) + window_dt_ns;

        let prior = self.measured_ns.load(Ordering::Acquire);
        let candidate = pending_dt / pending_n.max(1);
        let swung = prior == 0
            || candidate > prior.saturating_mul(2)
            || prior > candidate.saturating_mul(2);

        if pending_n as usize > buffer_high || pending_dt > MIN_DELAY_NS || swung {
            self.measured_ns.store(candidate.max(1), Ordering::Release);
            self.collected_n.store(0, Ordering::Release);
            self.collected_dt_ns.store(0, Ordering::Release);
        }
    }

    /// Desired worker count given the current `count` of live workers, the
    /// elapsed `duration_ns` since the last dispatch decision, the measured
    /// per-worker latency `L`, and the target yield latency `E` (both ns).
    ///
    /// The gain term `n1 = max(1, 1000/L)` is unitless in the spec it's
    /// drawn from; taken literally with `L` in nanoseconds it degenerates to
    /// 1 almost always (`L` is typically >> 1000ns). Interpreted instead
    /// with `L` in microseconds it behaves as a real gain over the dynamic
    /// range this scheduler actually sees, so that is the reading used here.
    pub fn desired_worker_count(count: u64, duration_ns: u64, latency_ns: u64, target_ns: u64, max_workers: usize) -> i64 {
        if latency_ns == 0 || target_ns == 0 {
            return 1;
        }
        let l = latency_ns as f64;
        let e = target_ns as f64;
        let n_base = l / e;
        let extra = (duration_ns as f64 / e) - count as f64;
        let l_us = (l / 1000.0).max(1.0);
        let gain = (1000.0 / l_us).max(1.0);
        let net = (n_base + extra / gain).round() as i64;
        net.min(max_workers as i64)
    }

    pub const MIN_DELAY_NS: u64 = MIN_DELAY_NS;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_clamped_to_buffer_high() {
        assert_eq!(WorkerWindow::period(100, 10), 10);
        assert_eq!(WorkerWindow::period(10_000_000, 10), 1);
    }

    #[test]
    fn period_is_never_zero() {
        assert_eq!(WorkerWindow::period(0, 10), 1);
    }

    #[test]
    fn collect_seeds_measurement_on_first_call() {
        let tracker = LatencyTracker::new(None);
        assert!(!tracker.has_measurement());
        tracker.collect(10, 10_000, 1500);
        assert!(tracker.has_measurement());
        assert_eq!(tracker.measured_ns(), 1000);
    }

    #[test]
    fn collect_accumulates_below_threshold() {
        let tracker = LatencyTracker::new(Some(500));
        // small window, well under buffer_high and min_delay, latency stable
        tracker.collect(1, 500, 10_000);
        // measured stays unless swing/threshold triggers; with only 1 sample
        // total pending_dt=500 < MIN_DELAY_NS and pending_n=1 < buffer_high
        // and candidate=500 == prior, not >2x, so no update forced except
        // the first-time bootstrap path isn't hit since prior != 0.
        assert_eq!(tracker.measured_ns(), 500);
    }

    #[test]
    fn desired_worker_count_scales_with_extra_duration() {
        let net = LatencyTracker::desired_worker_count(1, 10_000_000, 1_000_000, 1_000_000, 100);
        assert!(net >= 1);
    }

    #[test]
    fn desired_worker_count_capped_at_max() {
        let net = LatencyTracker::desired_worker_count(1, 1_000_000_000, 1_000, 1, 5);
        assert!(net <= 5);
    }
}
