use super::futex::{futex_wait, futex_wake_all};
use super::spin::SpinMutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Wakeup hook registered by the reader. Runs on the producer path, so it must not block.
pub type ReadyCallback = Arc<dyn Fn() + Send + Sync>;

/// Payload-free "data ready" signal.
///
/// Every [`fire`](Self::fire) bumps a 32-bit epoch, wakes futex waiters and runs the registered
/// callback. Fires that happen before anyone looks coalesce: a waiter only learns that the epoch
/// moved, not by how much.
pub struct ReadyNotifier {
    epoch: AtomicU32,
    callback: SpinMutex<Option<ReadyCallback>>,
}

impl ReadyNotifier {
    pub fn new() -> Self {
        Self {
            epoch: AtomicU32::new(0),
            callback: SpinMutex::new(None),
        }
    }

    pub fn fire(&self) {
        self.epoch.fetch_add(1, Ordering::Release);
        futex_wake_all(&self.epoch);

        // Clone out so the callback runs without the lock held.
        let callback = self.callback.lock().clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    /// Current epoch. Read it *before* checking for data, then pass it to [`wait`](Self::wait).
    #[inline]
    pub fn epoch(&self) -> u32 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Block until the epoch differs from `seen`, or `timeout` elapses. May wake spuriously.
    pub fn wait(&self, seen: u32, timeout: Option<Duration>) {
        futex_wait(&self.epoch, seen, timeout);
    }

    /// Install `callback`, returning the one it replaces.
    pub fn subscribe(&self, callback: ReadyCallback) -> Option<ReadyCallback> {
        self.callback.lock().replace(callback)
    }

    pub fn unsubscribe(&self) -> Option<ReadyCallback> {
        self.callback.lock().take()
    }
}

impl Default for ReadyNotifier {
    fn default() -> Self {
        Self::new()
    }
}
