use std::fmt;
use crate::MQueue::Buffer::MessageRing;
use crate::MQueue::{Consumer, Producer};

/// Debug function for MessageRing
///
/// Shows capacity and cursor state. The cursors are only sampled with `try_lock`, so formatting
/// never spins against a live producer; a busy ring prints as `<locked>`.
pub fn debug_message_ring<const MSG: usize, const QUEUE: usize>(
    ring: &MessageRing<MSG, QUEUE>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    let mut s = f.debug_struct("MessageRing");
    s.field("capacity", &QUEUE).field("max_message_size", &MSG);
    match ring.cursors.try_lock() {
        Some(cursors) => s
            .field("write", &cursors.write)
            .field("read", &cursors.read)
            .field("pending", &cursors.write.wrapping_sub(cursors.read)),
        None => s.field("cursors", &"<locked>"),
    };
    s.field("closed", &ring.is_closed()).finish()
}

/// Debug function for Producer
///
/// Shows the bus identity and the message under assembly.
pub fn debug_producer<const MSG: usize, const QUEUE: usize>(
    producer: &Producer<MSG, QUEUE>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    f.debug_struct("Producer")
        .field("bus_id", &producer.bus_id())
        .field("address", &format_args!("0x{:02x}", producer.address()))
        .field("assembly_slot", &producer.assembly_index())
        .field("in_progress", &producer.in_progress().len())
        .field("truncated", &producer.is_truncated())
        .field("ring", producer.ring())
        .finish()
}

/// Debug function for Consumer
pub fn debug_consumer<const MSG: usize, const QUEUE: usize>(
    consumer: &Consumer<MSG, QUEUE>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    f.debug_struct("Consumer")
        .field("dump_active", &consumer.hex_dump().is_active())
        .field("ring", consumer.ring())
        .finish_non_exhaustive()
}
