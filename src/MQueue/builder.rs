use super::{Consumer, Producer};
use crate::error::{MqueueError, Result};
use crate::Debug::{DumpConfig, HexDump};
use crate::MQueue::Buffer::{MessageRing, MSG_BUF_SIZE, QUEUE_SIZE};
use std::sync::Arc;

/// Largest 7-bit slave address.
pub const MAX_SLAVE_ADDRESS: u16 = 0x7F;

pub struct QueueBuilder {
    bus_id: i32,
    address: u16,
    dump: Arc<DumpConfig>,
}

impl Default for QueueBuilder {
    fn default() -> Self {
        Self {
            bus_id: 0,
            address: 0,
            dump: DumpConfig::disabled(),
        }
    }
}

impl QueueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus the queue listens on. Used for logging and the dump filter.
    pub fn with_bus_id(mut self, bus_id: i32) -> Self {
        self.bus_id = bus_id;
        self
    }

    /// Our own 7-bit slave address; it becomes the leading byte (`address << 1`) of every
    /// non-broadcast message.
    pub fn with_address(mut self, address: u16) -> Self {
        self.address = address;
        self
    }

    pub fn with_dump(mut self, dump: Arc<DumpConfig>) -> Self {
        self.dump = dump;
        self
    }

    /// Build a queue with the default sizes (256-byte messages, 32 retained).
    pub fn build(self) -> Result<(Producer, Consumer)> {
        self.build_sized::<{ MSG_BUF_SIZE }, { QUEUE_SIZE }>()
    }

    /// Build a queue holding `QUEUE` messages of at most `MSG` bytes each.
    ///
    /// `QUEUE` must be a power of two; this is checked when the sizes are instantiated.
    pub fn build_sized<const MSG: usize, const QUEUE: usize>(
        self,
    ) -> Result<(Producer<MSG, QUEUE>, Consumer<MSG, QUEUE>)> {
        if self.address > MAX_SLAVE_ADDRESS {
            return Err(MqueueError::InvalidAddress(self.address as u32));
        }

        let ring = Arc::new(MessageRing::<MSG, QUEUE>::new()?);
        let producer = Producer::new(Arc::clone(&ring), self.bus_id, self.address as u8);
        let consumer = Consumer::new(ring, HexDump::new(self.dump, self.bus_id));
        Ok((producer, consumer))
    }
}
