//! The doorbell: a lost-wakeup-free binary wakeup signal from producers to
//! the single consumer.
//!
//! Platform-specific implementations use the most efficient primitive
//! available; both honor the same contract so the dispatcher never has to
//! know which one is in play.

use std::time::Duration;

/// A doorbell the consumer waits on and producers ring.
///
/// Producers call [`Doorbell::ring`] when they transition a shared cell from
/// empty to non-empty (output queue 0->1, or a new current-seq heap entry
/// becomes available). The consumer calls [`Doorbell::wait`] when it has
/// nothing left to drain.
///
/// Spurious wakeups are permitted; lost wakeups are not. Callers must
/// re-check their condition after `wait` returns regardless of its result.
pub trait Doorbell: Send + Sync {
    /// Wait until rung or `timeout` elapses. Returns `true` if woken by a
    /// ring, `false` on timeout or spurious wakeup.
    fn wait(&self, timeout: Option<Duration>) -> bool;

    /// Ring the doorbell, waking the consumer if it is currently waiting.
    /// If nobody is waiting the ring is not queued — that's fine, it means
    /// the consumer is already busy and will see the new state on its own.
    fn ring(&self);

    /// Number of parked waiters (hint only, may be stale).
    fn parked_count(&self) -> usize;
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod futex_linux;
        pub use futex_linux::FutexDoorbell as PlatformDoorbell;
    } else {
        mod fallback;
        pub use fallback::CondvarDoorbell as PlatformDoorbell;
    }
}

/// Construct a new platform-appropriate doorbell.
pub fn new_doorbell() -> Box<dyn Doorbell> {
    Box::new(PlatformDoorbell::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn wait_times_out_without_ring() {
        let bell = new_doorbell();
        let start = std::time::Instant::now();
        let woken = bell.wait(Some(Duration::from_millis(30)));
        let elapsed = start.elapsed();
        assert!(!woken || elapsed < Duration::from_millis(100));
    }

    #[test]
    fn ring_wakes_a_waiting_consumer() {
        let bell: Arc<dyn Doorbell> = Arc::from(new_doorbell());
        let waiter = Arc::clone(&bell);
        let handle = thread::spawn(move || waiter.wait(Some(Duration::from_secs(5))));

        thread::sleep(Duration::from_millis(30));
        bell.ring();

        assert!(handle.join().unwrap());
    }
}
