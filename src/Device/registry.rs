use super::device::{MqueueDevice, ReadEndpoint, SlaveBus};
use super::spec::DeviceSpec;
use crate::error::{MqueueError, Result};
use crate::Debug::DumpConfig;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Devices instantiated at runtime, keyed by `(bus id, address)`.
pub struct DeviceRegistry {
    devices: Mutex<HashMap<(i32, u8), MqueueDevice>>,
    dump: Arc<DumpConfig>,
}

impl DeviceRegistry {
    /// Every device created here shares `dump`, so one toggle covers all buses.
    pub fn new(dump: Arc<DumpConfig>) -> Self {
        Self {
            devices: Mutex::new(HashMap::new()),
            dump,
        }
    }

    /// Handle a `new_device` line such as `"slave-mqueue 0x1013"` for `bus`.
    pub fn new_device(&self, bus: Arc<dyn SlaveBus>, line: &str) -> Result<ReadEndpoint> {
        let spec = DeviceSpec::parse(line)?;
        self.attach(bus, spec)
    }

    pub fn attach(&self, bus: Arc<dyn SlaveBus>, spec: DeviceSpec) -> Result<ReadEndpoint> {
        let key = (bus.bus_id(), spec.address);
        let mut devices = self.devices.lock();
        if devices.contains_key(&key) {
            return Err(MqueueError::AlreadyExists {
                bus_id: key.0,
                address: key.1,
            });
        }

        let device = MqueueDevice::probe(bus, spec, Arc::clone(&self.dump))?;
        let endpoint = device.endpoint().clone();
        devices.insert(key, device);
        Ok(endpoint)
    }

    /// Handle a `delete_device` line such as `"0x1013"` for `bus_id`.
    pub fn delete_device(&self, bus_id: i32, line: &str) -> Result<()> {
        let address = DeviceSpec::parse_delete(line)?;
        let device = self
            .devices
            .lock()
            .remove(&(bus_id, address))
            .ok_or(MqueueError::NotFound { bus_id, address })?;
        device.remove();
        Ok(())
    }

    pub fn endpoint(&self, bus_id: i32, address: u8) -> Option<ReadEndpoint> {
        self.devices
            .lock()
            .get(&(bus_id, address))
            .map(|device| device.endpoint().clone())
    }

    /// Run `f` against the device at `(bus_id, address)` with the registry locked.
    pub fn with_device<R>(
        &self,
        bus_id: i32,
        address: u8,
        f: impl FnOnce(&MqueueDevice) -> R,
    ) -> Option<R> {
        self.devices.lock().get(&(bus_id, address)).map(f)
    }

    pub fn len(&self) -> usize {
        self.devices.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.lock().is_empty()
    }

    pub fn dump_config(&self) -> &Arc<DumpConfig> {
        &self.dump
    }
}
