//! # ssv-core
//!
//! Platform-agnostic primitives for the Stream Scheduler Variable (SSV): a
//! bounded, rate-adaptive multi-producer/single-consumer conduit.
//!
//! This crate contains no OS-specific code. Worker threads, parking/doorbell
//! implementations, and configuration live in `ssv-runtime`.
//!
//! ## Modules
//!
//! - `atomic` - CAS-loop modify primitive and memory barriers
//! - `queue` - lock-free work-queue disciplines (LIFO, FIFO, Ahead single-slot)
//! - `heap` - reorder heap keyed by sequence number
//! - `outq` - output queue (event list + length) and `ChildEvent`
//! - `cancel` - cooperative cancellation token
//! - `error` - error types
//! - `ids` - worker identifiers
//! - `spinlock` - internal spinlock primitive
//! - `log` - leveled debug printing macros
//! - `env` - environment variable utilities

#![allow(dead_code)]

pub mod atomic;
pub mod cancel;
pub mod env;
pub mod error;
pub mod heap;
pub mod ids;
pub mod log;
pub mod outq;
pub mod queue;
pub mod spinlock;

pub use cancel::CancellationToken;
pub use env::{env_get, env_get_bool, env_get_opt, env_get_str, env_is_set};
pub use error::{SsvError, SsvResult};
pub use heap::ReorderHeap;
pub use ids::WorkerId;
pub use outq::{ChildEvent, OutputQueue};
pub use queue::{ahead::AheadQueue, fifo::FifoQueue, lifo::LifoQueue};
pub use spinlock::SpinLock;
