// src/MQueue/consumer.rs

use crate::error::{MqueueError, Result};
use crate::Core::ReadyCallback;
use crate::Debug::HexDump;
use crate::MQueue::Buffer::{MessageRing, MSG_BUF_SIZE, QUEUE_SIZE};
use crate::MQueue::Structs::{Drained, QueueStats};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The reading side of the queue.
///
/// [`drain`](Self::drain) is the core operation: it never blocks and pops at most one message.
/// The `receive*` family layers owned buffers and waiting on top of it.
pub struct Consumer<const MSG: usize = { MSG_BUF_SIZE }, const QUEUE: usize = { QUEUE_SIZE }> {
    ring: Arc<MessageRing<MSG, QUEUE>>,
    dump: HexDump,
}

impl<const MSG: usize, const QUEUE: usize> Consumer<MSG, QUEUE> {
    pub(crate) fn new(ring: Arc<MessageRing<MSG, QUEUE>>, dump: HexDump) -> Self {
        Self { ring, dump }
    }

    /// Pop the oldest message into `dst`.
    ///
    /// # Returns
    /// * `Ok(Drained { len, more })` with the message in `dst[..len]`
    /// * `Ok(Drained::EMPTY)` if nothing is queued
    /// * `Err(TooLarge)` if the message exceeds `dst`; it is dropped anyway and the next call
    ///   returns the message after it
    ///
    /// When `more` is set the ready notification has been fired again.
    pub fn drain(&self, dst: &mut [u8]) -> Result<Drained> {
        let drained = self.ring.drain_into(dst)?;
        if !drained.is_empty() {
            self.dump.dump(&dst[..drained.len]);
        }
        Ok(drained)
    }

    /// Receives a message if one is available.
    ///
    /// # Returns
    /// * `Ok(Some(data))` if a message was received
    /// * `Ok(None)` if no message is available
    /// * `Err(Disconnected)` if the queue is empty and the producer is gone
    pub fn receive(&self) -> Result<Option<Vec<u8>>> {
        // Sampled before draining: close() happens after the producer's last commit, so an
        // empty drain behind a closed ring means nothing is left.
        let closed = self.ring.is_closed();
        let mut buf = [0u8; MSG];
        let drained = self.drain(&mut buf)?;
        if !drained.is_empty() {
            return Ok(Some(buf[..drained.len].to_vec()));
        }
        if closed {
            return Err(MqueueError::Disconnected);
        }
        Ok(None)
    }

    /// Receives a message, blocking until one is available or the producer terminates.
    pub fn receive_blocking(&self) -> Result<Vec<u8>> {
        let notifier = self.ring.notifier();
        loop {
            // Sample before looking so a message landing in between still wakes us.
            let seen = notifier.epoch();
            if let Some(msg) = self.receive()? {
                return Ok(msg);
            }
            notifier.wait(seen, None);
        }
    }

    /// Receives a message, waiting up to `timeout`.
    ///
    /// # Returns
    /// * `Ok(Some(data))` if a message was received
    /// * `Ok(None)` if the timeout was reached
    /// * `Err(Disconnected)` if the producer has terminated
    pub fn receive_timeout(&self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        let notifier = self.ring.notifier();
        let deadline = Instant::now() + timeout;
        loop {
            let seen = notifier.epoch();
            if let Some(msg) = self.receive()? {
                return Ok(Some(msg));
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            notifier.wait(seen, Some(remaining));
        }
    }

    /// Register the wakeup hook fired when a message lands or a drain leaves more behind.
    ///
    /// The hook runs on the producer's context and must return quickly without blocking.
    /// Returns the hook it replaces.
    pub fn subscribe_ready<F>(&self, callback: F) -> Option<ReadyCallback>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.ring.notifier().subscribe(Arc::new(callback))
    }

    pub fn unsubscribe_ready(&self) -> Option<ReadyCallback> {
        self.ring.notifier().unsubscribe()
    }

    pub fn has_pending(&self) -> bool {
        self.ring.pending() > 0
    }

    pub fn is_disconnected(&self) -> bool {
        self.ring.is_closed()
    }

    pub fn stats(&self) -> QueueStats {
        self.ring.stats()
    }

    /// Number of messages the ring retains.
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Largest message, address byte included.
    pub fn max_message_size(&self) -> usize {
        self.ring.max_message_size()
    }

    pub fn hex_dump(&self) -> &HexDump {
        &self.dump
    }

    pub(crate) fn ring(&self) -> &Arc<MessageRing<MSG, QUEUE>> {
        &self.ring
    }
}
