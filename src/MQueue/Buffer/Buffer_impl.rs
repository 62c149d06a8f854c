use std::cell::UnsafeCell;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};

use crossbeam_utils::CachePadded;
use tracing::{debug, trace};

use super::Buffer::{Cursors, MessageRing, MessageSlot, RingCounters, MIN_MESSAGE_LEN};
use crate::error::{MqueueError, Result};
use crate::Core::{ReadyNotifier, SpinMutex};
use crate::MQueue::Structs::{Drained, QueueStats};

impl<const MSG: usize> MessageSlot<MSG> {
    pub(crate) const fn zeroed() -> Self {
        Self {
            len: 0,
            buf: [0; MSG],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Start a new message with its leading address byte.
    #[inline]
    pub(crate) fn begin(&mut self, address_byte: u8) {
        self.buf[0] = address_byte;
        self.len = 1;
    }

    /// Append one byte. Returns false, leaving the slot untouched, when it is already full.
    #[inline]
    pub(crate) fn push(&mut self, byte: u8) -> bool {
        if self.len < MSG {
            self.buf[self.len] = byte;
            self.len += 1;
            true
        } else {
            false
        }
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }
}

impl<const MSG: usize, const QUEUE: usize> MessageRing<MSG, QUEUE> {
    /// Position mask. Evaluating it rejects bad sizes at build time.
    pub const MASK: usize = {
        assert!(
            QUEUE.is_power_of_two() && QUEUE >= 2,
            "queue capacity must be a power of two of at least 2"
        );
        assert!(
            MSG >= MIN_MESSAGE_LEN,
            "message buffer must hold an address byte and one payload byte"
        );
        QUEUE - 1
    };

    /// Arena slot the producer starts assembling into.
    pub(crate) const FIRST_ASSEMBLY: usize = QUEUE;

    /// Allocate the arena once, zero-filled. Fails instead of aborting if memory is short.
    pub fn new() -> Result<Self> {
        let _ = Self::MASK;

        let slots = QUEUE + 1;
        let mut arena = Vec::new();
        arena
            .try_reserve_exact(slots)
            .map_err(|_| MqueueError::Allocation { slots })?;
        arena.extend((0..slots).map(|_| UnsafeCell::new(MessageSlot::zeroed())));

        Ok(Self {
            arena: arena.into_boxed_slice(),
            cursors: CachePadded::new(SpinMutex::new(Cursors {
                write: 0,
                read: 0,
                order: core::array::from_fn(|pos| pos),
            })),
            notifier: ReadyNotifier::new(),
            closed: std::sync::atomic::AtomicBool::new(false),
            counters: RingCounters::default(),
        })
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        QUEUE
    }

    #[inline]
    pub const fn max_message_size(&self) -> usize {
        MSG
    }

    /// Shared view of an arena slot.
    ///
    /// # Safety
    /// Nobody may be writing `index` for the lifetime of the returned reference: either the
    /// caller owns it as its assembly slot, or it sits in the live range and the lock is held.
    #[inline]
    pub(crate) unsafe fn slot(&self, index: usize) -> &MessageSlot<MSG> {
        &*self.arena[index].get()
    }

    /// Exclusive view of an arena slot.
    ///
    /// # Safety
    /// `index` must be the slot the caller currently owns as its assembly slot, and no other
    /// reference to it may be live.
    #[allow(clippy::mut_from_ref)]
    #[inline]
    pub(crate) unsafe fn slot_mut(&self, index: usize) -> &mut MessageSlot<MSG> {
        &mut *self.arena[index].get()
    }

    /// Publish the assembled slot `index` and hand back the slot the producer owns next.
    ///
    /// If the ring already holds `QUEUE` messages the oldest unread one is evicted first; its
    /// slot is the one recycled.
    pub(crate) fn commit(&self, index: usize) -> usize {
        let (recycled, evicted) = {
            let mut cursors = self.cursors.lock();
            let evicted = cursors.write.wrapping_sub(cursors.read) == QUEUE;
            if evicted {
                cursors.read = cursors.read.wrapping_add(1);
            }
            let pos = cursors.write & Self::MASK;
            let recycled = std::mem::replace(&mut cursors.order[pos], index);
            cursors.write = cursors.write.wrapping_add(1);
            (recycled, evicted)
        };

        self.counters.finalized.fetch_add(1, Relaxed);
        if evicted {
            self.counters.evicted.fetch_add(1, Relaxed);
            trace!(capacity = QUEUE, "ring full, evicted oldest unread message");
        }

        self.notifier.fire();
        recycled
    }

    /// Pop the oldest message into `dst`.
    ///
    /// An oversized message is consumed all the same and reported as `TooLarge`, so a reader
    /// with a small buffer never gets stuck on it.
    pub(crate) fn drain_into(&self, dst: &mut [u8]) -> Result<Drained> {
        let (copied, more) = {
            let mut cursors = self.cursors.lock();
            if cursors.read == cursors.write {
                return Ok(Drained::EMPTY);
            }

            let index = cursors.order[cursors.read & Self::MASK];
            // SAFETY: positions in [read, write) are never the producer's assembly slot, and the
            // producer only swaps slots while holding this lock.
            let slot = unsafe { self.slot(index) };
            let copied = if slot.len <= dst.len() {
                dst[..slot.len].copy_from_slice(slot.as_bytes());
                Ok(slot.len)
            } else {
                Err(MqueueError::TooLarge {
                    len: slot.len,
                    capacity: dst.len(),
                })
            };

            cursors.read = cursors.read.wrapping_add(1);
            (copied, cursors.read != cursors.write)
        };

        match &copied {
            Ok(_) => self.counters.delivered.fetch_add(1, Relaxed),
            Err(err) => {
                debug!(error = %err, "dropping message too large for reader");
                self.counters.oversized.fetch_add(1, Relaxed)
            }
        };

        if more {
            self.notifier.fire();
        }

        copied.map(|len| Drained { len, more })
    }

    /// Messages waiting to be drained.
    pub fn pending(&self) -> usize {
        let cursors = self.cursors.lock();
        cursors.write.wrapping_sub(cursors.read)
    }

    pub fn notifier(&self) -> &ReadyNotifier {
        &self.notifier
    }

    /// Mark the producer side gone and wake anyone waiting.
    pub(crate) fn close(&self) {
        self.closed.store(true, Release);
        self.notifier.fire();
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Acquire)
    }

    pub fn stats(&self) -> QueueStats {
        let c = &self.counters;
        QueueStats {
            finalized: c.finalized.load(Relaxed),
            evicted: c.evicted.load(Relaxed),
            truncated: c.truncated.load(Relaxed),
            short_dropped: c.short_dropped.load(Relaxed),
            oversized: c.oversized.load(Relaxed),
            delivered: c.delivered.load(Relaxed),
            pending: self.pending() as u32,
            capacity: QUEUE as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(ring: &MessageRing<8, 4>, assembly: usize, bytes: &[u8]) -> usize {
        let slot = unsafe { ring.slot_mut(assembly) };
        slot.begin(bytes[0]);
        for &b in &bytes[1..] {
            assert!(slot.push(b));
        }
        ring.commit(assembly)
    }

    #[test]
    fn commit_recycles_every_slot_exactly_once() {
        let ring = MessageRing::<8, 4>::new().unwrap();
        let mut assembly = MessageRing::<8, 4>::FIRST_ASSEMBLY;

        for round in 0..20u8 {
            assembly = fill(&ring, assembly, &[round, round]);

            let mut owners: Vec<usize> = ring.cursors.lock().order.to_vec();
            owners.push(assembly);
            owners.sort_unstable();
            assert_eq!(owners, vec![0, 1, 2, 3, 4], "round {round}");
        }
    }

    #[test]
    fn full_ring_evicts_oldest() {
        let ring = MessageRing::<8, 4>::new().unwrap();
        let mut assembly = MessageRing::<8, 4>::FIRST_ASSEMBLY;
        for i in 0..6u8 {
            assembly = fill(&ring, assembly, &[0x20, i]);
        }
        assert_eq!(ring.pending(), 4);
        assert_eq!(ring.stats().evicted, 2);

        let mut buf = [0u8; 8];
        let first = ring.drain_into(&mut buf).unwrap();
        assert_eq!(&buf[..first.len], &[0x20, 2]);
        assert!(first.more);
    }

    #[test]
    fn slot_push_stops_at_capacity() {
        let mut slot = MessageSlot::<3>::zeroed();
        slot.begin(0xAA);
        assert!(slot.push(1));
        assert!(slot.push(2));
        assert!(!slot.push(3));
        assert_eq!(slot.as_bytes(), &[0xAA, 1, 2]);
        slot.clear();
        assert!(slot.is_empty());
    }
}
