//! Passive bus-slave message queue.
//!
//! Bytes written to us by a bus master arrive one event at a time. The [`Producer`] assembles
//! them into messages, a bounded ring keeps the most recent ones (evicting the oldest when full)
//! and a single [`Consumer`] drains them one message per call.
//!
//! ```
//! use slave_mqueue::{BusEvent, QueueBuilder};
//!
//! let (mut producer, consumer) = QueueBuilder::new().with_address(0x10).build().unwrap();
//!
//! let _ = producer.handle_event(BusEvent::Start { broadcast: false });
//! let _ = producer.handle_event(BusEvent::Byte(0x01));
//! let _ = producer.handle_event(BusEvent::Stop);
//!
//! let mut buf = [0u8; 256];
//! let drained = consumer.drain(&mut buf).unwrap();
//! assert_eq!(&buf[..drained.len], &[0x20, 0x01]);
//! ```

// Module naming follows project convention (MQueue = slave message queue)
#[allow(non_snake_case)]
pub mod MQueue;
#[allow(non_snake_case)]
pub mod Core;
#[allow(non_snake_case)]
pub mod Debug;
#[allow(non_snake_case)]
pub mod Device;

pub mod error;
pub mod ffi;

pub use error::{MqueueError, Result};
pub use MQueue::Buffer::{MSG_BUF_SIZE, QUEUE_SIZE};
pub use MQueue::Structs::{BusEvent, Drained, EventOutcome, QueueStats};
pub use MQueue::{Consumer, Producer, QueueBuilder};
