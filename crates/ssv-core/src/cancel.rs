//! Cancellation token for cooperative cancellation.
//!
//! Workers check for cancellation via their token and exit gracefully.
//! Tokens can be linked to form parent-child relationships so that
//! cancelling a parent SSV also cancels every child it spawned.

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{SsvError, SsvResult};

/// Token for checking and triggering cancellation.
///
/// Each worker receives a cancellation token. The token can be checked at
/// any point to see if cancellation was requested. When cancelled,
/// operations should return `Err(SsvError::Cancelled)`.
#[derive(Clone)]
pub struct CancellationToken {
    inner: CancellationInner,
}

#[derive(Clone)]
enum CancellationInner {
    /// Heap-allocated token, optionally chained to a parent.
    Owned(Arc<OwnedCancellation>),
    /// Dummy token that never cancels.
    Dummy,
}

struct OwnedCancellation {
    cancelled: AtomicBool,
    parent: Option<CancellationToken>,
}

impl CancellationToken {
    /// Create a new independent cancellation token.
    pub fn new() -> Self {
        Self {
            inner: CancellationInner::Owned(Arc::new(OwnedCancellation {
                cancelled: AtomicBool::new(false),
                parent: None,
            })),
        }
    }

    /// Create a dummy token that never cancels.
    pub fn dummy() -> Self {
        Self {
            inner: CancellationInner::Dummy,
        }
    }

    /// Create a child token linked to this one.
    ///
    /// If this token is cancelled, checking the child also returns
    /// cancelled. Cancelling the child does not affect the parent.
    pub fn child(&self) -> Self {
        Self {
            inner: CancellationInner::Owned(Arc::new(OwnedCancellation {
                cancelled: AtomicBool::new(false),
                parent: Some(self.clone()),
            })),
        }
    }

    /// Check if cancellation was requested, recursing into the parent chain.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        match &self.inner {
            CancellationInner::Owned(arc) => {
                if arc.cancelled.load(Ordering::Acquire) {
                    return true;
                }
                match &arc.parent {
                    Some(parent) => parent.is_cancelled(),
                    None => false,
                }
            }
            CancellationInner::Dummy => false,
        }
    }

    /// Request cancellation. Only sets this token's own flag; children will
    /// observe cancellation the next time they check.
    pub fn cancel(&self) {
        if let CancellationInner::Owned(arc) = &self.inner {
            arc.cancelled.store(true, Ordering::Release);
        }
    }

    /// Check cancellation, returning `Err(SsvError::Cancelled)` if set. The
    /// idiomatic call site in a worker's yield loop.
    #[inline]
    pub fn check(&self) -> SsvResult<()> {
        if self.is_cancelled() {
            Err(SsvError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Reset cancellation for token reuse. Does not affect parent or
    /// previously-created child tokens.
    pub fn reset(&self) {
        if let CancellationInner::Owned(arc) = &self.inner {
            arc.cancelled.store(false, Ordering::Release);
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_cancellation() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());

        token.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(SsvError::Cancelled)));
    }

    #[test]
    fn child_inherits_parent_cancel() {
        let parent = CancellationToken::new();
        let child = parent.child();
        assert!(!child.is_cancelled());

        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn child_cancel_is_independent() {
        let parent = CancellationToken::new();
        let child = parent.child();

        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn deep_hierarchy_propagates() {
        let root = CancellationToken::new();
        let level1 = root.child();
        let level2 = level1.child();
        let level3 = level2.child();

        assert!(!level3.is_cancelled());
        root.cancel();
        assert!(level1.is_cancelled());
        assert!(level2.is_cancelled());
        assert!(level3.is_cancelled());
    }

    #[test]
    fn reset_clears_flag() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(token.is_cancelled());
        token.reset();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn clone_shares_state() {
        let token1 = CancellationToken::new();
        let token2 = token1.clone();
        token1.cancel();
        assert!(token2.is_cancelled());
    }

    #[test]
    fn dummy_token_never_cancels() {
        let token = CancellationToken::dummy();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(!token.is_cancelled());
    }
}
