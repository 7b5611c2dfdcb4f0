//! Scheduler configuration.

use std::fmt;

/// Configuration shared by every SSV created in a process (or overridden
/// per-SSV via [`crate::shared::SsvShared`] construction).
#[derive(Debug, Clone)]
pub struct SsvConfig {
    /// Maximum number of concurrent workers. `0` means synchronous: every
    /// task runs on the enqueuing thread, no worker is ever spawned.
    pub threads_high: usize,

    /// Maximum outstanding output events before a worker backs off.
    pub buffer_high: usize,

    /// Target yields/s. `-1` means unbounded (bounded mode); any positive
    /// value selects paced mode.
    pub stream_rate: i64,

    /// Optional bootstrap latency hint in nanoseconds, used before the
    /// first real measurement arrives.
    pub worker_latency_ns: Option<u64>,

    /// Optional cap on total yields across the SSV's lifetime.
    pub yield_limit: Option<u64>,

    /// Minimum worker floor for paced mode, so a stalled bootstrap measurer
    /// doesn't leave the pool pinned at zero indefinitely.
    pub min_workers: usize,
}

impl Default for SsvConfig {
    fn default() -> Self {
        Self {
            threads_high: 1500,
            buffer_high: 1500,
            stream_rate: -1,
            worker_latency_ns: None,
            yield_limit: None,
            min_workers: 1,
        }
    }
}

impl SsvConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from environment variables, falling back to
    /// [`SsvConfig::default`] for anything unset or unparsable.
    ///
    /// Recognizes `SSV_THREADS_HIGH`, `SSV_BUFFER_HIGH`, `SSV_STREAM_RATE`,
    /// `SSV_WORKER_LATENCY_NS`, `SSV_YIELD_LIMIT`, `SSV_MIN_WORKERS`.
    pub fn from_env() -> Self {
        use ssv_core::env::{env_get, env_get_opt};
        let default = Self::default();
        Self {
            threads_high: env_get("SSV_THREADS_HIGH", default.threads_high),
            buffer_high: env_get("SSV_BUFFER_HIGH", default.buffer_high),
            stream_rate: env_get("SSV_STREAM_RATE", default.stream_rate),
            worker_latency_ns: env_get_opt("SSV_WORKER_LATENCY_NS").or(default.worker_latency_ns),
            yield_limit: env_get_opt("SSV_YIELD_LIMIT").or(default.yield_limit),
            min_workers: env_get("SSV_MIN_WORKERS", default.min_workers),
        }
    }

    pub fn threads_high(mut self, n: usize) -> Self {
        self.threads_high = n;
        self
    }

    pub fn buffer_high(mut self, n: usize) -> Self {
        self.buffer_high = n;
        self
    }

    pub fn stream_rate(mut self, r: i64) -> Self {
        self.stream_rate = r;
        self
    }

    pub fn worker_latency_ns(mut self, ns: u64) -> Self {
        self.worker_latency_ns = Some(ns);
        self
    }

    pub fn yield_limit(mut self, limit: u64) -> Self {
        self.yield_limit = Some(limit);
        self
    }

    pub fn min_workers(mut self, n: usize) -> Self {
        self.min_workers = n;
        self
    }

    /// `true` when `stream_rate > 0` (paced mode selected per the
    /// construction rule).
    pub fn is_paced(&self) -> bool {
        self.stream_rate > 0
    }

    /// `true` when `threads_high == 0` (synchronous mode).
    pub fn is_synchronous(&self) -> bool {
        self.threads_high == 0
    }

    /// Target yield latency `E` in nanoseconds, if paced.
    pub fn target_latency_ns(&self) -> Option<u64> {
        if self.is_paced() {
            Some((1_000_000_000u64) / (self.stream_rate as u64))
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_high == 0 && self.threads_high != 0 {
            return Err(ConfigError::ZeroBuffer);
        }
        if self.is_paced() && self.min_workers == 0 {
            return Err(ConfigError::PacedNeedsMinWorker);
        }
        if self.min_workers > self.threads_high && self.threads_high != 0 {
            return Err(ConfigError::MinExceedsMax {
                min: self.min_workers,
                max: self.threads_high,
            });
        }
        Ok(())
    }

    pub fn print(&self) {
        ssv_core::slog_info!("{self}");
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ZeroBuffer,
    PacedNeedsMinWorker,
    MinExceedsMax { min: usize, max: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroBuffer => write!(f, "buffer_high must be nonzero unless threads_high is also 0"),
            ConfigError::PacedNeedsMinWorker => {
                write!(f, "paced mode (stream_rate > 0) requires min_workers >= 1")
            }
            ConfigError::MinExceedsMax { min, max } => {
                write!(f, "min_workers ({min}) exceeds threads_high ({max})")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl fmt::Display for SsvConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SsvConfig {{ threads_high: {}, buffer_high: {}, stream_rate: {}, worker_latency_ns: {:?}, yield_limit: {:?}, min_workers: {} }}",
            self.threads_high, self.buffer_high, self.stream_rate, self.worker_latency_ns, self.yield_limit, self.min_workers
        )
    }
}
