//! Lifecycle glue around the queue: instantiation on a slave-capable bus, the read endpoint
//! and a registry for devices created at runtime. The queue itself knows nothing of this.

pub mod device;
pub mod registry;
pub mod spec;

pub use device::{MqueueDevice, ReadEndpoint, SlaveBus, SlaveHandler};
pub use registry::DeviceRegistry;
pub use spec::{DeviceSpec, DEVICE_NAME};
