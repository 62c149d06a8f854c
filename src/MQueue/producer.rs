// In src/MQueue/producer.rs
use crate::MQueue::Buffer::{
    MessageRing, MessageSlot, MIN_MESSAGE_LEN, MSG_BUF_SIZE, NO_DATA, QUEUE_SIZE,
};
use crate::MQueue::Structs::{BusEvent, EventOutcome};
use std::sync::atomic::Ordering::Relaxed;
use std::sync::Arc;
use tracing::{debug, warn};

/// The bus-event side of the queue.
///
/// Feeds events into the slot under construction and publishes it to the ring on stop.
/// There is exactly one producer per queue and events must reach it one at a time, in bus
/// order; `handle_event` taking `&mut self` is what enforces that on the Rust side. The
/// assembly slot is written without any lock, and nothing here ever sleeps, so it is fine to
/// drive from an interrupt-like context.
pub struct Producer<const MSG: usize = { MSG_BUF_SIZE }, const QUEUE: usize = { QUEUE_SIZE }> {
    ring: Arc<MessageRing<MSG, QUEUE>>,
    assembly: usize,
    truncated: bool,
    bus_id: i32,
    address: u8,
}

impl<const MSG: usize, const QUEUE: usize> Producer<MSG, QUEUE> {
    pub(crate) fn new(ring: Arc<MessageRing<MSG, QUEUE>>, bus_id: i32, address: u8) -> Self {
        Self {
            ring,
            assembly: MessageRing::<MSG, QUEUE>::FIRST_ASSEMBLY,
            truncated: false,
            bus_id,
            address,
        }
    }

    /// Process one bus event.
    ///
    /// # Returns
    /// * `Accepted` for starts, stored bytes and stops
    /// * `Truncated` for a byte that no longer fits; the bus may NAK it
    /// * `Reply(0xFF)` when the master asks us for data we don't provide
    pub fn handle_event(&mut self, event: BusEvent) -> EventOutcome {
        match event {
            BusEvent::Start { broadcast } => {
                self.truncated = false;
                let address_byte = if broadcast { 0 } else { self.address << 1 };
                self.assembly_mut().begin(address_byte);
                EventOutcome::Accepted
            }
            BusEvent::Byte(byte) => {
                // Once truncated, nothing is appended until the next start.
                if !self.truncated && self.assembly_mut().push(byte) {
                    return EventOutcome::Accepted;
                }
                if !self.truncated {
                    warn!(
                        bus_id = self.bus_id,
                        address = self.address,
                        max = MSG,
                        "message is truncated"
                    );
                }
                self.truncated = true;
                EventOutcome::Truncated
            }
            BusEvent::Stop => {
                self.finish();
                EventOutcome::Accepted
            }
            BusEvent::Other => EventOutcome::Reply(NO_DATA),
        }
    }

    fn finish(&mut self) {
        let len = self.assembly().len();
        let counters = &self.ring.counters;

        if self.truncated {
            if len > 0 {
                counters.truncated.fetch_add(1, Relaxed);
                debug!(bus_id = self.bus_id, "discarding truncated message");
            }
        } else if len >= MIN_MESSAGE_LEN {
            self.assembly = self.ring.commit(self.assembly);
        } else if len > 0 {
            // A lone address byte is not a message.
            counters.short_dropped.fetch_add(1, Relaxed);
            debug!(bus_id = self.bus_id, len, "discarding short message");
        }

        // The truncated flag outlives the stop so stray bytes stay rejected until a new start.
        self.assembly_mut().clear();
    }

    #[inline]
    fn assembly(&self) -> &MessageSlot<MSG> {
        // SAFETY: the assembly slot is owned by this producer until it is committed
        unsafe { self.ring.slot(self.assembly) }
    }

    #[inline]
    fn assembly_mut(&mut self) -> &mut MessageSlot<MSG> {
        // SAFETY: as above, and `&mut self` rules out a second live reference
        unsafe { self.ring.slot_mut(self.assembly) }
    }

    /// Bytes collected so far for the message in progress.
    pub fn in_progress(&self) -> &[u8] {
        self.assembly().as_bytes()
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn bus_id(&self) -> i32 {
        self.bus_id
    }

    /// The 7-bit slave address this queue answers to.
    pub fn address(&self) -> u8 {
        self.address
    }

    pub(crate) fn ring(&self) -> &Arc<MessageRing<MSG, QUEUE>> {
        &self.ring
    }

    pub(crate) fn assembly_index(&self) -> usize {
        self.assembly
    }
}

impl<const MSG: usize, const QUEUE: usize> Drop for Producer<MSG, QUEUE> {
    fn drop(&mut self) {
        self.ring.close();
    }
}
