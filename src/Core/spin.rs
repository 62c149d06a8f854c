//! A non-sleeping lock for state shared with the bus event path.
//!
//! The producer may run where suspending is not allowed, so waiters busy-wait with exponential
//! spinning instead of parking. Critical sections must stay short and bounded.

use crossbeam_utils::Backoff;
use parking_lot::lock_api::{self, GuardSend, RawMutex};
use std::sync::atomic::{AtomicBool, Ordering};

/// Test-and-test-and-set spin lock plugged into `lock_api`.
pub struct RawSpinLock {
    locked: AtomicBool,
}

unsafe impl RawMutex for RawSpinLock {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: RawSpinLock = RawSpinLock {
        locked: AtomicBool::new(false),
    };

    type GuardMarker = GuardSend;

    fn lock(&self) {
        let backoff = Backoff::new();
        while !self.try_lock() {
            // Spin on a plain load so contended waiters don't bounce the cache line.
            while self.locked.load(Ordering::Relaxed) {
                backoff.spin();
            }
        }
    }

    #[inline]
    fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    unsafe fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }

    #[inline]
    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

pub type SpinMutex<T> = lock_api::Mutex<RawSpinLock, T>;
pub type SpinMutexGuard<'a, T> = lock_api::MutexGuard<'a, RawSpinLock, T>;
