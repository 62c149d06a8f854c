pub mod futex;
pub mod notify;
pub mod spin;

pub use notify::{ReadyCallback, ReadyNotifier};
pub use spin::{RawSpinLock, SpinMutex, SpinMutexGuard};
