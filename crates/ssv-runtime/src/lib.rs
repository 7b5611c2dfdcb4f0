//! # ssv-runtime
//!
//! The worker pool, dispatcher, latency/pacing accounting, and
//! configuration for a Stream Scheduler Variable (SSV). Platform-specific
//! bits (the doorbell's parking primitive) live under [`doorbell`]; the
//! rest is plain `std::thread` plumbing that runs the same on every
//! target.

#![allow(dead_code)]

pub mod config;
pub mod dispatch;
pub mod doorbell;
pub mod latency;
pub mod shared;
pub mod style;
pub mod task;
pub mod time;
pub mod worker;

pub use config::{ConfigError, SsvConfig};
pub use dispatch::Dispatcher;
pub use doorbell::{new_doorbell, Doorbell};
pub use latency::LatencyTracker;
pub use shared::SsvShared;
pub use style::{drive_synchronously, AheadOrderedStyle, AsyncLifoStyle, ParallelUnboundedStyle, Style, WAsyncFifoStyle};
pub use task::{Producer, Task, WorkLoop};
pub use time::now_ns;
pub use worker::{run_masked, spawn_worker, WorkerInfo, WorkerPanic, WorkerSet};
