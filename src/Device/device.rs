use super::spec::{DeviceSpec, DEVICE_NAME};
use crate::error::Result;
use crate::Core::ReadyCallback;
use crate::Debug::DumpConfig;
use crate::MQueue::Buffer::{MSG_BUF_SIZE, QUEUE_SIZE};
use crate::MQueue::Structs::{BusEvent, EventOutcome};
use crate::MQueue::{Consumer, QueueBuilder};
use std::sync::Arc;
use tracing::info;

/// Event sink handed to the bus. Owns the queue's producer.
pub type SlaveHandler = Box<dyn FnMut(BusEvent) -> EventOutcome + Send>;

/// A bus controller that can act as a slave at one or more of its own addresses.
pub trait SlaveBus: Send + Sync {
    fn bus_id(&self) -> i32;

    /// Route events addressed to `address` into `handler` until unregistered.
    ///
    /// Implementations must deliver events to a handler one at a time, in bus order.
    fn register_slave(&self, address: u8, handler: SlaveHandler) -> Result<()>;

    /// Stop routing and drop the handler.
    fn unregister_slave(&self, address: u8);
}

/// Read-only, file-like view of a queue: each `read` returns one whole message.
#[derive(Clone)]
pub struct ReadEndpoint {
    consumer: Arc<Consumer>,
}

impl ReadEndpoint {
    /// Owner read-only.
    pub const MODE: u32 = 0o400;

    fn new(consumer: Arc<Consumer>) -> Self {
        Self { consumer }
    }

    pub fn name(&self) -> &'static str {
        DEVICE_NAME
    }

    /// Advertised size: the whole ring at maximum message length.
    pub fn size(&self) -> usize {
        MSG_BUF_SIZE * QUEUE_SIZE
    }

    /// Pop one message into `buf`; `Ok(0)` when nothing is queued.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        self.consumer.drain(buf).map(|drained| drained.len)
    }

    /// Wake `callback` whenever there is something new to read.
    pub fn set_notify<F>(&self, callback: F) -> Option<ReadyCallback>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.consumer.subscribe_ready(callback)
    }

    pub fn consumer(&self) -> &Arc<Consumer> {
        &self.consumer
    }
}

/// One queue attached to a bus.
///
/// Probing builds the queue, exposes its [`ReadEndpoint`] and hands the producer to the bus.
/// Removing (or dropping) unregisters from the bus, which drops the producer; readers then see
/// whatever is left followed by `Disconnected`.
pub struct MqueueDevice {
    bus: Arc<dyn SlaveBus>,
    spec: DeviceSpec,
    endpoint: ReadEndpoint,
    attached: bool,
}

impl MqueueDevice {
    pub fn probe(bus: Arc<dyn SlaveBus>, spec: DeviceSpec, dump: Arc<DumpConfig>) -> Result<Self> {
        let bus_id = bus.bus_id();
        let (mut producer, consumer) = QueueBuilder::new()
            .with_bus_id(bus_id)
            .with_address(spec.address as u16)
            .with_dump(dump)
            .build()?;

        let endpoint = ReadEndpoint::new(Arc::new(consumer));
        bus.register_slave(
            spec.address,
            Box::new(move |event| producer.handle_event(event)),
        )?;

        info!(bus_id, address = spec.address, name = %spec.name, "slave queue attached");
        Ok(Self {
            bus,
            spec,
            endpoint,
            attached: true,
        })
    }

    pub fn endpoint(&self) -> &ReadEndpoint {
        &self.endpoint
    }

    pub fn spec(&self) -> &DeviceSpec {
        &self.spec
    }

    pub fn bus_id(&self) -> i32 {
        self.bus.bus_id()
    }

    pub fn address(&self) -> u8 {
        self.spec.address
    }

    pub fn remove(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        self.bus.unregister_slave(self.spec.address);
        info!(
            bus_id = self.bus.bus_id(),
            address = self.spec.address,
            "slave queue detached"
        );
    }
}

impl Drop for MqueueDevice {
    fn drop(&mut self) {
        self.detach();
    }
}
