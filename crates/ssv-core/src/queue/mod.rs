//! Lock-free work-queue disciplines, one per SSV style.
//!
//! - [`lifo`] — depth-first Async style: a Treiber stack.
//! - [`fifo`] — breadth-first WAsync style: a Michael-Scott queue.
//! - [`ahead`] — Ahead-Ordered style: a single-slot sequenced buffer.

pub mod ahead;
pub mod fifo;
pub mod lifo;
