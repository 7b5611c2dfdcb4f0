//! Linux futex-based doorbell.
//!
//! The futex word represents pending rings: `ring()` increments and wakes,
//! `wait()` consumes a pending ring if one is already there, otherwise sleeps.

use super::Doorbell;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

/// Linux futex-based doorbell.
pub struct FutexDoorbell {
    futex: AtomicU32,
    parked: AtomicUsize,
}

impl FutexDoorbell {
    pub fn new() -> Self {
        Self {
            futex: AtomicU32::new(0),
            parked: AtomicUsize::new(0),
        }
    }
}

impl Default for FutexDoorbell {
    fn default() -> Self {
        Self::new()
    }
}

impl Doorbell for FutexDoorbell {
    fn wait(&self, timeout: Option<Duration>) -> bool {
        loop {
            let current = self.futex.load(Ordering::Acquire);
            if current > 0 {
                if self
                    .futex
                    .compare_exchange_weak(current, current - 1, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    return true;
                }
                continue;
            }
            break;
        }

        self.parked.fetch_add(1, Ordering::SeqCst);

        let timespec = timeout.map(|d| libc::timespec {
            tv_sec: d.as_secs() as i64,
            tv_nsec: d.subsec_nanos() as i64,
        });

        let timespec_ptr = match &timespec {
            Some(ts) => ts as *const libc::timespec,
            None => std::ptr::null(),
        };

        let result = unsafe {
            libc::syscall(
                libc::SYS_futex,
                self.futex.as_ptr(),
                libc::FUTEX_WAIT | libc::FUTEX_PRIVATE_FLAG,
                0u32,
                timespec_ptr,
                std::ptr::null::<u32>(),
                0u32,
            )
        };

        self.parked.fetch_sub(1, Ordering::SeqCst);

        if result != 0 {
            loop {
                let current = self.futex.load(Ordering::Acquire);
                if current > 0 {
                    if self
                        .futex
                        .compare_exchange_weak(current, current - 1, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return true;
                    }
                    continue;
                }
                break;
            }
        }

        result == 0
    }

    fn ring(&self) {
        self.futex.fetch_add(1, Ordering::Release);

        if self.parked.load(Ordering::Acquire) > 0 {
            unsafe {
                libc::syscall(
                    libc::SYS_futex,
                    self.futex.as_ptr(),
                    libc::FUTEX_WAKE | libc::FUTEX_PRIVATE_FLAG,
                    1i32,
                    std::ptr::null::<libc::timespec>(),
                    std::ptr::null::<u32>(),
                    0u32,
                );
            }
        }
    }

    fn parked_count(&self) -> usize {
        self.parked.load(Ordering::Relaxed)
    }
}

// Safety: FutexDoorbell only contains atomics.
unsafe impl Send for FutexDoorbell {}
unsafe impl Sync for FutexDoorbell {}
