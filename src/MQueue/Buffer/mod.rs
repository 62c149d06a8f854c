pub mod Buffer;
pub mod Buffer_impl;

pub use Buffer::{MessageRing, MessageSlot, MIN_MESSAGE_LEN, MSG_BUF_SIZE, NO_DATA, QUEUE_SIZE}; // re-export for stable path
