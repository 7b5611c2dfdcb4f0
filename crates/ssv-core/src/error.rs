//! Error types for the stream scheduler variable.

use core::fmt;

use crate::ids::WorkerId;

/// Result type for SSV operations.
pub type SsvResult<T> = Result<T, SsvError>;

/// The closed set of error kinds the scheduler core can produce.
///
/// Deliberately small: queue-full/buffer-overrun and yield-limit-exhausted
/// are *not* represented here because they are not errors (see `spec`'s
/// error-handling design) — they are signaled back to callers as plain
/// booleans/`Option`s instead.
#[derive(Debug)]
pub enum SsvError {
    /// A worker task panicked; its payload is captured via the mask/try
    /// idiom and wrapped here. The consumer re-raises this after cancelling
    /// siblings.
    WorkerPanicked {
        worker: WorkerId,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The computation was cancelled via a `CancellationToken`.
    Cancelled,

    /// The Ahead style's single-slot work queue was not empty on enqueue.
    /// Reachable only if left-associated composition ever enqueues into the
    /// same SSV; see DESIGN.md for the precondition this enforces.
    AheadSlotNotEmpty,
}

impl fmt::Display for SsvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SsvError::WorkerPanicked { worker, source } => {
                write!(f, "worker {worker} panicked: {source}")
            }
            SsvError::Cancelled => write!(f, "operation cancelled"),
            SsvError::AheadSlotNotEmpty => write!(f, "ahead work slot already occupied"),
        }
    }
}

impl std::error::Error for SsvError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SsvError::WorkerPanicked { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
