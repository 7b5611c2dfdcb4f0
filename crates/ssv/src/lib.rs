//! # ssv
//!
//! Stream Scheduler Variable: a bounded, rate-adaptive multi-producer/
//! single-consumer conduit that evaluates producer computations
//! concurrently and delivers their results, in a well-defined order, to a
//! single consumer.
//!
//! ## Quick Start
//!
//! ```ignore
//! use ssv::{gather, Ssv, SsvState};
//!
//! let mut n = 0;
//! let first = Box::new(move || { n += 1; (n <= 3).then_some(n) });
//! let ssv = Ssv::new_ahead(SsvState::default(), first);
//! let values = gather(&ssv).unwrap();
//! assert_eq!(values, vec![1, 2, 3]);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      User combinators                       │
//! │        enqueue(), read_output(), gather(), wait()            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Ssv facade                           │
//! │   style dispatch (LIFO / FIFO / Ahead / Parallel) + dispatch │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//!    ┌───────────┐      ┌───────────┐      ┌───────────┐
//!    │  Worker   │      │  Worker   │      │ Doorbell  │
//!    │  Thread   │      │  Thread   │      │  Wakeup   │
//!    └───────────┘      └───────────┘      └───────────┘
//!          │                   │                   │
//!          └───────────────────┼───────────────────┘
//!                              ▼
//!    ┌─────────────────────────────────────────────────────────┐
//!    │              Output queue + reorder heap                │
//!    └─────────────────────────────────────────────────────────┘
//! ```

pub mod driver;
pub mod ssv;

// Re-export leveled print macros for debug diagnostics.
pub use ssv_core::{slog_debug, slog_error, slog_info, slog_trace, slog_warn};
pub use ssv_core::log::{init as init_logging, set_flush_enabled, set_log_level, set_time_enabled, LogLevel};

// Re-export env utilities.
pub use ssv_core::{env_get, env_get_bool, env_get_opt, env_get_str, env_is_set};

// Re-export core data types.
pub use ssv_core::{CancellationToken, ChildEvent, SsvError, SsvResult, WorkerId};

// Re-export runtime types needed to build tasks and work loops.
pub use ssv_runtime::{Producer, SsvConfig, Task, WorkLoop};

pub use driver::{gather, wait};
pub use ssv::{Ssv, SsvState};
