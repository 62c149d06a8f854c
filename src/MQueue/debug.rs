use super::Buffer::MessageRing;
use super::{Consumer, Producer};
use std::fmt;

// Debug proxy implementations that call the standalone debug functions
impl<const MSG: usize, const QUEUE: usize> fmt::Debug for MessageRing<MSG, QUEUE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_message_ring(self, f)
    }
}

impl<const MSG: usize, const QUEUE: usize> fmt::Debug for Producer<MSG, QUEUE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_producer(self, f)
    }
}

impl<const MSG: usize, const QUEUE: usize> fmt::Debug for Consumer<MSG, QUEUE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_consumer(self, f)
    }
}
