// Hex dump of drained messages, captured from the `slave_mqueue::dump` log target.
//
// Each test installs its own scoped subscriber; they are #[serial] so callsite interest is
// never shared between two live subscribers.
//
// cargo test --test hexdump -- --nocapture

use parking_lot::Mutex;
use serial_test::serial;
use slave_mqueue::Debug::{hex_rows, DumpConfig};
use slave_mqueue::{BusEvent, Consumer, MqueueError, Producer, QueueBuilder};
use std::io;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const BUS_ID: i32 = 1;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock())
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Run `f` with dump output (and nothing else) written to `out`.
fn capture<T>(out: &Captured, f: impl FnOnce() -> T) -> T {
    let writer = out.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("slave_mqueue::dump=info"))
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .with_level(false)
        .with_target(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

fn queue(dump: &Arc<DumpConfig>) -> (Producer, Consumer) {
    QueueBuilder::new()
        .with_bus_id(BUS_ID)
        .with_address(0x10)
        .with_dump(Arc::clone(dump))
        .build()
        .unwrap()
}

fn send(producer: &mut Producer, payload: &[u8]) {
    let _ = producer.handle_event(BusEvent::Start { broadcast: false });
    for &b in payload {
        let _ = producer.handle_event(BusEvent::Byte(b));
    }
    let _ = producer.handle_event(BusEvent::Stop);
}

fn expected_rows(bytes: &[u8]) -> Vec<String> {
    hex_rows(bytes)
        .map(|row| format!("bus_id:{BUS_ID}: {row}").trim().to_string())
        .collect()
}

#[test]
#[serial]
fn drained_message_is_dumped_row_by_row() {
    let out = Captured::default();
    let dump = Arc::new(DumpConfig::new(true, BUS_ID));
    let (mut producer, consumer) = queue(&dump);

    let mut buf = [0u8; 256];
    let len = capture(&out, || {
        send(&mut producer, b"dump me, please!!");
        consumer.drain(&mut buf).unwrap().len
    });

    assert_eq!(len, 18);
    let lines = out.lines();
    assert_eq!(lines, expected_rows(&buf[..len]));
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("bus_id:1: 20 64 75 6d 70"));
    assert!(lines[0].ends_with(" dump me, please"));
    assert!(lines[1].starts_with("bus_id:1: 21 21"));
    assert!(lines[1].ends_with("!!"));
}

#[test]
#[serial]
fn empty_and_oversized_drains_dump_nothing() {
    let out = Captured::default();
    let dump = Arc::new(DumpConfig::new(true, BUS_ID));
    let (mut producer, consumer) = queue(&dump);

    capture(&out, || {
        let mut buf = [0u8; 256];
        assert!(consumer.drain(&mut buf).unwrap().is_empty());

        send(&mut producer, &[1, 2, 3, 4, 5]);
        let mut small = [0u8; 4];
        assert_eq!(
            consumer.drain(&mut small),
            Err(MqueueError::TooLarge { len: 6, capacity: 4 })
        );
    });

    assert!(out.lines().is_empty(), "unexpected dump: {:?}", out.lines());
}

#[test]
#[serial]
fn filter_follows_bus_id_and_enable_toggles() {
    let out = Captured::default();
    let dump = Arc::new(DumpConfig::new(true, BUS_ID + 1));
    let (mut producer, consumer) = queue(&dump);
    let mut buf = [0u8; 256];

    // Another bus is selected.
    capture(&out, || {
        send(&mut producer, &[0xAA]);
        assert_eq!(consumer.drain(&mut buf).unwrap().len, 2);
    });
    assert!(out.lines().is_empty());

    // Disabled, even with the right bus selected.
    dump.set_bus_id(BUS_ID);
    dump.set_enabled(false);
    capture(&out, || {
        send(&mut producer, &[0xBB]);
        assert_eq!(consumer.drain(&mut buf).unwrap().len, 2);
    });
    assert!(out.lines().is_empty());

    dump.set_enabled(true);
    capture(&out, || {
        send(&mut producer, &[0x43]);
        assert_eq!(consumer.drain(&mut buf).unwrap().len, 2);
    });
    assert_eq!(out.lines(), expected_rows(&[0x20, 0x43]));
}
