// Slot arena and ring cursors shared by the bus event path and the reader.

use crate::Core::{ReadyNotifier, SpinMutex};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicU64};

/// Default maximum message length in bytes, address byte included.
pub const MSG_BUF_SIZE: usize = 256;

/// Default number of completed messages retained. Must be a power of two.
pub const QUEUE_SIZE: usize = 32;

/// Address byte plus at least one payload byte.
pub const MIN_MESSAGE_LEN: usize = 2;

/// Byte handed back to the bus when the master asks us for data.
pub const NO_DATA: u8 = 0xFF;

/// One message buffer. Only `buf[..len]` is meaningful.
#[repr(C)]
pub struct MessageSlot<const MSG: usize> {
    pub(crate) len: usize,
    pub(crate) buf: [u8; MSG],
}

/// Ring bookkeeping, only ever touched with the spin lock held.
///
/// `write` and `read` are free-running counters; a ring position is `counter & mask`.
/// `order[pos]` names the arena slot currently sitting at that position.
pub(crate) struct Cursors<const QUEUE: usize> {
    pub(crate) write: usize,
    pub(crate) read: usize,
    pub(crate) order: [usize; QUEUE],
}

/// Event counters, updated with relaxed atomics outside the lock.
#[derive(Default)]
pub(crate) struct RingCounters {
    pub(crate) finalized: AtomicU64,
    pub(crate) evicted: AtomicU64,
    pub(crate) truncated: AtomicU64,
    pub(crate) short_dropped: AtomicU64,
    pub(crate) oversized: AtomicU64,
    pub(crate) delivered: AtomicU64,
}

/// Bounded overwrite ring of completed messages.
///
/// ### Ownership of slots
/// The arena holds `QUEUE + 1` slots. `QUEUE` of them are named by ring positions and one by the
/// producer as its assembly slot. Finalizing swaps the assembly index into the ring and takes the
/// recycled index back, so every arena slot has exactly one owner at any time:
/// - the producer writes its assembly slot without the lock;
/// - the reader copies from `order[read & mask]` with the lock held.
///
/// The two never name the same slot.
pub struct MessageRing<const MSG: usize = { MSG_BUF_SIZE }, const QUEUE: usize = { QUEUE_SIZE }> {
    pub(crate) arena: Box<[UnsafeCell<MessageSlot<MSG>>]>,
    pub(crate) cursors: CachePadded<SpinMutex<Cursors<QUEUE>>>,
    pub(crate) notifier: ReadyNotifier,
    pub(crate) closed: AtomicBool,
    pub(crate) counters: RingCounters,
}

// The arena is only reached through the ownership discipline documented above.
unsafe impl<const MSG: usize, const QUEUE: usize> Send for MessageRing<MSG, QUEUE> {}
unsafe impl<const MSG: usize, const QUEUE: usize> Sync for MessageRing<MSG, QUEUE> {}
