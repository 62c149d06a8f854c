// Values crossing the producer and reader boundaries

/// Raw event codes as delivered by the bus framework's slave callback.
pub mod raw {
    pub const READ_REQUESTED: u32 = 0;
    pub const WRITE_REQUESTED: u32 = 1;
    pub const READ_PROCESSED: u32 = 2;
    pub const WRITE_RECEIVED: u32 = 3;
    pub const STOP: u32 = 4;
    pub const GCALL_REQUESTED: u32 = 5;
}

/// One bus event, in arrival order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusEvent {
    /// A master started writing to us. `broadcast` is set for a general call.
    Start { broadcast: bool },
    /// One data byte written by the master.
    Byte(u8),
    /// End of transfer.
    Stop,
    /// Anything else, e.g. the master wants to read from us.
    Other,
}

impl BusEvent {
    /// Map a raw framework event code and its value byte. Unknown codes become `Other`.
    pub fn from_raw(code: u32, value: u8) -> Self {
        match code {
            raw::WRITE_REQUESTED => BusEvent::Start { broadcast: false },
            raw::GCALL_REQUESTED => BusEvent::Start { broadcast: true },
            raw::WRITE_RECEIVED => BusEvent::Byte(value),
            raw::STOP => BusEvent::Stop,
            _ => BusEvent::Other,
        }
    }
}

/// What the bus layer should do after an event.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    Accepted,
    /// The byte overflowed the message buffer; the message will be discarded at stop.
    Truncated,
    /// Respond to the master with this byte.
    Reply(u8),
}

impl EventOutcome {
    #[inline]
    pub fn is_truncated(&self) -> bool {
        matches!(self, EventOutcome::Truncated)
    }
}

/// Result of a successful drain. `len == 0 && !more` means the ring was empty.
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Drained {
    pub len: usize,
    pub more: bool,
}

impl Drained {
    pub const EMPTY: Drained = Drained {
        len: 0,
        more: false,
    };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Counter snapshot. ABI-stable so it can be copied out through the C interface.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Messages that reached the ring.
    pub finalized: u64,
    /// Unread messages overwritten because the ring was full.
    pub evicted: u64,
    /// Messages discarded at stop because they overflowed.
    pub truncated: u64,
    /// Messages discarded at stop because they were shorter than two bytes.
    pub short_dropped: u64,
    /// Messages dropped by a drain whose buffer was too small.
    pub oversized: u64,
    /// Messages copied out to the reader.
    pub delivered: u64,
    /// Messages currently waiting in the ring.
    pub pending: u32,
    /// Ring capacity in messages.
    pub capacity: u32,
}
