use parking_lot::Mutex;
use slave_mqueue::Debug::DumpConfig;
use slave_mqueue::Device::{
    DeviceRegistry, DeviceSpec, MqueueDevice, ReadEndpoint, SlaveBus, SlaveHandler,
};
use slave_mqueue::{BusEvent, EventOutcome, MqueueError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory controller that routes events to whichever handler owns an address.
struct MockBus {
    id: i32,
    handlers: Mutex<HashMap<u8, SlaveHandler>>,
    refuse: bool,
}

impl MockBus {
    fn new(id: i32) -> Arc<Self> {
        Arc::new(Self {
            id,
            handlers: Mutex::new(HashMap::new()),
            refuse: false,
        })
    }

    fn refusing(id: i32) -> Arc<Self> {
        Arc::new(Self {
            id,
            handlers: Mutex::new(HashMap::new()),
            refuse: true,
        })
    }

    fn dispatch(&self, address: u8, event: BusEvent) -> Option<EventOutcome> {
        self.handlers
            .lock()
            .get_mut(&address)
            .map(|handler| handler(event))
    }

    fn write(&self, address: u8, payload: &[u8]) {
        self.dispatch(address, BusEvent::Start { broadcast: false });
        for &b in payload {
            self.dispatch(address, BusEvent::Byte(b));
        }
        self.dispatch(address, BusEvent::Stop);
    }

    fn registered(&self) -> usize {
        self.handlers.lock().len()
    }
}

impl SlaveBus for MockBus {
    fn bus_id(&self) -> i32 {
        self.id
    }

    fn register_slave(&self, address: u8, handler: SlaveHandler) -> Result<()> {
        if self.refuse {
            return Err(MqueueError::Registration {
                bus_id: self.id,
                address,
                reason: "controller has no slave mode".to_string(),
            });
        }
        self.handlers.lock().insert(address, handler);
        Ok(())
    }

    fn unregister_slave(&self, address: u8) {
        self.handlers.lock().remove(&address);
    }
}

#[test]
fn probe_routes_bus_traffic_to_endpoint() {
    let bus = MockBus::new(1);
    let device = MqueueDevice::probe(
        bus.clone(),
        DeviceSpec::new(0x13).unwrap(),
        DumpConfig::disabled(),
    )
    .unwrap();
    assert_eq!(device.bus_id(), 1);
    assert_eq!(device.address(), 0x13);
    assert_eq!(bus.registered(), 1);

    bus.write(0x13, &[0xDE, 0xAD]);

    let endpoint = device.endpoint();
    assert_eq!(endpoint.name(), "slave-mqueue");
    assert_eq!(endpoint.size(), 256 * 32);
    assert_eq!(ReadEndpoint::MODE, 0o400);
    let mut buf = [0u8; 256];
    assert_eq!(endpoint.read(&mut buf), Ok(3));
    assert_eq!(&buf[..3], &[0x26, 0xDE, 0xAD]);
    assert_eq!(endpoint.read(&mut buf), Ok(0));
}

#[test]
fn read_requests_are_answered_with_no_data() {
    let bus = MockBus::new(1);
    let _device =
        MqueueDevice::probe(bus.clone(), DeviceSpec::new(0x13).unwrap(), DumpConfig::disabled())
            .unwrap();

    assert_eq!(
        bus.dispatch(0x13, BusEvent::Other),
        Some(EventOutcome::Reply(0xFF))
    );
}

#[test]
fn remove_unregisters_and_disconnects_readers() {
    let bus = MockBus::new(4);
    let device =
        MqueueDevice::probe(bus.clone(), DeviceSpec::new(0x20).unwrap(), DumpConfig::disabled())
            .unwrap();
    let endpoint = device.endpoint().clone();

    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    endpoint.set_notify(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    bus.write(0x20, &[1]);
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    device.remove();
    assert_eq!(bus.registered(), 0);
    // Removal wakes pollers so they notice the hang-up.
    assert_eq!(fired.load(Ordering::SeqCst), 2);

    let consumer = endpoint.consumer();
    assert!(consumer.is_disconnected());
    assert_eq!(consumer.receive(), Ok(Some(vec![0x40, 1])));
    assert_eq!(consumer.receive(), Err(MqueueError::Disconnected));
}

#[test]
fn probe_fails_when_bus_refuses() {
    let bus = MockBus::refusing(2);
    let err = MqueueDevice::probe(bus, DeviceSpec::new(0x13).unwrap(), DumpConfig::disabled())
        .err()
        .unwrap();
    assert!(matches!(err, MqueueError::Registration { bus_id: 2, address: 0x13, .. }));
}

#[test]
fn registry_creates_and_deletes_devices() {
    let registry = DeviceRegistry::new(DumpConfig::disabled());
    let bus = MockBus::new(0);

    let endpoint = registry.new_device(bus.clone(), "slave-mqueue 0x1013").unwrap();
    assert_eq!(registry.len(), 1);
    assert!(registry.endpoint(0, 0x13).is_some());
    let name = registry.with_device(0, 0x13, |d| d.spec().name.clone());
    assert_eq!(name.as_deref(), Some("slave-mqueue"));

    bus.write(0x13, &[7, 8]);
    let mut buf = [0u8; 16];
    assert_eq!(endpoint.read(&mut buf), Ok(3));

    assert_eq!(
        registry.new_device(bus.clone(), "slave-mqueue 0x1013").err(),
        Some(MqueueError::AlreadyExists {
            bus_id: 0,
            address: 0x13
        })
    );

    registry.delete_device(0, "0x1013").unwrap();
    assert!(registry.is_empty());
    assert_eq!(bus.registered(), 0);
    assert_eq!(
        registry.delete_device(0, "0x1013"),
        Err(MqueueError::NotFound {
            bus_id: 0,
            address: 0x13
        })
    );
}

#[test]
fn registry_keys_devices_by_bus() {
    let registry = DeviceRegistry::new(DumpConfig::disabled());
    let bus_a = MockBus::new(0);
    let bus_b = MockBus::new(1);

    registry.new_device(bus_a.clone(), "slave-mqueue 0x1013").unwrap();
    registry.new_device(bus_b.clone(), "slave-mqueue 0x1013").unwrap();
    assert_eq!(registry.len(), 2);

    bus_b.write(0x13, &[5]);
    let mut buf = [0u8; 8];
    assert_eq!(registry.endpoint(0, 0x13).unwrap().read(&mut buf), Ok(0));
    assert_eq!(registry.endpoint(1, 0x13).unwrap().read(&mut buf), Ok(2));
}

#[test]
fn registry_rejects_bad_lines() {
    let registry = DeviceRegistry::new(DumpConfig::disabled());
    let bus = MockBus::new(0);

    assert!(matches!(
        registry.new_device(bus.clone(), "eeprom 0x1050"),
        Err(MqueueError::InvalidDeviceSpec(_))
    ));
    assert!(matches!(
        registry.new_device(bus.clone(), "slave-mqueue 0x13"),
        Err(MqueueError::InvalidDeviceSpec(_))
    ));
    assert_eq!(
        registry.new_device(bus, "slave-mqueue 0x1080").err(),
        Some(MqueueError::InvalidAddress(0x80))
    );
    assert!(registry.is_empty());
}
